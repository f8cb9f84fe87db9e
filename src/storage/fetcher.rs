//! Size- and time-bounded template reads.

use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ObjectStore, StorageError, StoredObject};
use crate::core::RenderdError;

/// A raw asset passed through without template processing.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Asset bytes
    pub body: Bytes,
    /// MIME type reported by the store
    pub content_type: Option<String>,
}

/// Fetches template documents from an [`ObjectStore`].
///
/// Every read is bounded by `timeout`. Template reads are additionally bounded
/// by `max_size`: an object whose reported length exceeds the ceiling is
/// rejected without looking at the body, and a body that turns out larger
/// than the ceiling is rejected rather than truncated.
///
/// All storage failures surface as [`RenderdError::TemplateUnavailable`]; the
/// precise cause is logged and kept in the error's `reason` field.
#[derive(Debug, Clone)]
pub struct TemplateFetcher<S> {
    store: S,
    max_size: u64,
    timeout: Duration,
}

impl<S: ObjectStore> TemplateFetcher<S> {
    /// Wrap `store` with a size ceiling and read timeout.
    pub const fn new(store: S, max_size: u64, timeout: Duration) -> Self {
        Self {
            store,
            max_size,
            timeout,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Configured byte ceiling.
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Fetch a template document as text.
    ///
    /// Bytes are decoded as UTF-8; invalid sequences are replaced rather than
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::TemplateUnavailable`] on any read failure,
    /// timeout, missing body or size violation.
    pub async fn fetch(&self, key: &str) -> Result<String, RenderdError> {
        match self.fetch_checked(key).await {
            Ok(body) => {
                debug!("Fetched template '{}' ({} bytes)", key, body.len());
                Ok(String::from_utf8_lossy(&body).into_owned())
            }
            Err(err) => {
                warn!("Template fetch failed for '{}': {}", key, err);
                Err(unavailable(key, &err))
            }
        }
    }

    /// Fetch a raw asset. Only the timeout applies.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::TemplateUnavailable`] on any read failure or
    /// missing body.
    pub async fn fetch_asset(&self, key: &str) -> Result<Asset, RenderdError> {
        let result = async {
            let object = self.read(key, None).await?;
            let body = object.body.ok_or_else(|| StorageError::MissingBody {
                key: key.to_string(),
            })?;
            Ok::<_, StorageError>(Asset {
                body,
                content_type: object.content_type,
            })
        }
        .await;

        result.map_err(|err| {
            warn!("Asset fetch failed for '{}': {}", key, err);
            unavailable(key, &err)
        })
    }

    async fn fetch_checked(&self, key: &str) -> Result<Bytes, StorageError> {
        let object = self.read(key, Some(self.max_size)).await?;

        let reported = object.content_length.unwrap_or(0);
        if reported > self.max_size {
            return Err(self.too_large(key, reported));
        }

        let body = object.body.ok_or_else(|| StorageError::MissingBody {
            key: key.to_string(),
        })?;

        let actual = body.len() as u64;
        if actual > self.max_size {
            return Err(self.too_large(key, actual));
        }

        Ok(body)
    }

    /// Read under the timeout, asking the store to stop past `max_size` when given.
    async fn read(&self, key: &str, max_size: Option<u64>) -> Result<StoredObject, StorageError> {
        let read = async {
            match max_size {
                Some(max_size) => self.store.get_object_within(key, max_size).await,
                None => self.store.get_object(key).await,
            }
        };
        tokio::time::timeout(self.timeout, read).await.map_err(|_| {
            StorageError::Timeout {
                key: key.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        })?
    }

    fn too_large(&self, key: &str, size: u64) -> StorageError {
        StorageError::SizeLimitExceeded {
            key: key.to_string(),
            size,
            limit: self.max_size,
        }
    }
}

fn unavailable(key: &str, err: &StorageError) -> RenderdError {
    RenderdError::TemplateUnavailable {
        key: key.to_string(),
        reason: err.to_string(),
    }
}
