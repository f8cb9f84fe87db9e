//! Object storage access for template documents.
//!
//! Templates live in a key-addressed blob store. This module defines the
//! narrow [`ObjectStore`] interface the render pipeline consumes, two
//! implementations of it, and the [`TemplateFetcher`] that layers the size
//! ceiling and read timeout on top.
//!
//! # Backends
//!
//! - [`HttpObjectStore`] - S3-style HTTP endpoint (`GET {endpoint}/{bucket}/{key}`)
//! - [`LocalObjectStore`] - a directory on disk, for development and tests
//! - [`ConfiguredStore`] - whichever of the two the [`ServiceConfig`] selects
//!
//! [`ServiceConfig`]: crate::config::ServiceConfig

mod fetcher;
mod http;
mod local;

pub use fetcher::{Asset, TemplateFetcher};
pub use http::HttpObjectStore;
pub use local::LocalObjectStore;

use bytes::Bytes;
use std::future::Future;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::core::RenderdError;

/// An object as returned by the store.
///
/// Mirrors what object stores report: the body may be missing even on a
/// successful read, and the length is whatever the store claims.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    /// Object body, if the store returned one
    pub body: Option<Bytes>,
    /// Length reported by the store (e.g. the `Content-Length` header)
    pub content_length: Option<u64>,
    /// MIME type reported by the store
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Build an object from a body, deriving the reported length from it.
    pub fn from_body(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            content_length: Some(body.len() as u64),
            body: Some(body),
            content_type: None,
        }
    }

    /// Attach a content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Storage-level failures.
///
/// These never reach request callers directly; the fetcher collapses all of
/// them into [`RenderdError::TemplateUnavailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No object exists under the key
    #[error("object '{key}' not found")]
    NotFound {
        /// Requested key
        key: String,
    },

    /// The store answered with a non-success status
    #[error("object store returned HTTP {status} for '{key}'")]
    Status {
        /// Requested key
        key: String,
        /// HTTP status code
        status: u16,
    },

    /// Connection or protocol failure
    #[error("transport error reading '{key}': {message}")]
    Transport {
        /// Requested key
        key: String,
        /// Client error message
        message: String,
    },

    /// The read did not finish within the configured timeout
    #[error("reading '{key}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Requested key
        key: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// The store reported success but sent no body
    #[error("object '{key}' has no body")]
    MissingBody {
        /// Requested key
        key: String,
    },

    /// The object is larger than the configured ceiling
    #[error("object '{key}' is {size} bytes, limit is {limit}")]
    SizeLimitExceeded {
        /// Requested key
        key: String,
        /// Reported or actual size
        size: u64,
        /// Configured ceiling
        limit: u64,
    },

    /// The key cannot be mapped onto this store
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey {
        /// Requested key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Local filesystem failure
    #[error("I/O error reading '{key}': {message}")]
    Io {
        /// Requested key
        key: String,
        /// I/O error message
        message: String,
    },
}

/// Key-addressed blob read.
///
/// Implementations perform a single read and report what the backend
/// returned. Timeouts are applied by [`TemplateFetcher`]. Size ceilings are
/// checked by the fetcher too, but a store that can see an object's length
/// before reading it should override [`get_object_within`] and stop early.
///
/// [`get_object_within`]: ObjectStore::get_object_within
pub trait ObjectStore: Send + Sync {
    /// Read the object stored under `key`.
    fn get_object(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;

    /// Read the object stored under `key`, giving up with
    /// [`StorageError::SizeLimitExceeded`] once it is known to exceed
    /// `max_size` bytes.
    ///
    /// The default reads the whole object and leaves the check to the caller.
    fn get_object_within(
        &self,
        key: &str,
        max_size: u64,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send {
        let _ = max_size;
        self.get_object(key)
    }
}

/// Whether `key` has a `..` segment, with either slash as separator.
pub(crate) fn has_parent_segment(key: &str) -> bool {
    key.split(['/', '\\']).any(|segment| segment == "..")
}

/// The store selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    /// Remote HTTP object store
    Http(HttpObjectStore),
    /// Local directory
    Local(LocalObjectStore),
}

impl ConfiguredStore {
    /// Build the store described by `config.storage`.
    ///
    /// A local `root` takes precedence over a remote `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::ConfigError`] if neither is configured or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RenderdError> {
        if let Some(root) = &config.storage.root {
            return Ok(Self::Local(LocalObjectStore::new(root.clone())));
        }
        if let Some(endpoint) = &config.storage.endpoint {
            let store = HttpObjectStore::new(
                endpoint.clone(),
                config.storage.bucket.clone(),
                config.fetch_timeout(),
            )?;
            return Ok(Self::Http(store));
        }
        Err(RenderdError::config("storage needs either an endpoint or a local root directory"))
    }
}

impl ObjectStore for ConfiguredStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        match self {
            Self::Http(store) => store.get_object(key).await,
            Self::Local(store) => store.get_object(key).await,
        }
    }

    async fn get_object_within(
        &self,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError> {
        match self {
            Self::Http(store) => store.get_object_within(key, max_size).await,
            Self::Local(store) => store.get_object_within(key, max_size).await,
        }
    }
}
