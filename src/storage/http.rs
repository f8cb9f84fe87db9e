//! HTTP object store backed by `reqwest`.

use bytes::BytesMut;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

use super::{ObjectStore, StorageError, StoredObject};
use crate::core::RenderdError;

/// Reads objects from an S3-style HTTP endpoint.
///
/// Objects are addressed as `{endpoint}/{bucket}/{key}`; with an empty bucket
/// the bucket segment is omitted. The client carries the configured request
/// timeout so a stalled connection is abandoned even outside the fetcher.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl HttpObjectStore {
    /// Create a store for `endpoint` and `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(endpoint: String, bucket: String, timeout: Duration) -> Result<Self, RenderdError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderdError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.trim_matches('/').to_string(),
        })
    }

    /// URL an object key resolves to.
    #[must_use]
    pub fn object_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.bucket.is_empty() {
            format!("{}/{}", self.endpoint, key)
        } else {
            format!("{}/{}/{}", self.endpoint, self.bucket, key)
        }
    }
}

impl HttpObjectStore {
    async fn read_object(
        &self,
        key: &str,
        max_size: Option<u64>,
    ) -> Result<StoredObject, StorageError> {
        if super::has_parent_segment(key) {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "key must not contain '..' segments".to_string(),
            });
        }

        let url = self.object_url(key);
        debug!("Fetching object from {}", url);

        let transport = |e: reqwest::Error| StorageError::Transport {
            key: key.to_string(),
            message: e.to_string(),
        };

        let mut response = self.client.get(&url).send().await.map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let exceeded = |size: u64, limit: u64| StorageError::SizeLimitExceeded {
            key: key.to_string(),
            size,
            limit,
        };

        if let (Some(size), Some(limit)) = (content_length, max_size)
            && size > limit
        {
            return Err(exceeded(size, limit));
        }

        // Chunked or mislabelled responses are cut off as soon as they pass the limit.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            let size = (body.len() + chunk.len()) as u64;
            if let Some(limit) = max_size.filter(|&limit| size > limit) {
                return Err(exceeded(size, limit));
            }
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();

        Ok(StoredObject {
            content_length: content_length.or(Some(body.len() as u64)),
            body: Some(body),
            content_type,
        })
    }
}

impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.read_object(key, None).await
    }

    async fn get_object_within(
        &self,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError> {
        self.read_object(key, Some(max_size)).await
    }
}
