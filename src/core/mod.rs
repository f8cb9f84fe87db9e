//! Core types and error handling for renderd.
//!
//! This module holds the error taxonomy every other module reports through.
//! See [`error`] for the full description of each failure kind.

pub mod error;

pub use error::{ErrorContext, ErrorKind, RenderdError, user_friendly_error};
