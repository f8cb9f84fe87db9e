//! Integration test suite for renderd
//!
//! End-to-end tests over the public library API, the axum router and the
//! compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: Render scenarios against in-memory and on-disk stores
//! - **server**: HTTP routes, status codes and headers
//! - **cli**: `render`, `validate` and config handling through the binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod pipeline;
mod server;
