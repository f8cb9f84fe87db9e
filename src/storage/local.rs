//! Directory-backed object store.

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::{ObjectStore, StorageError, StoredObject};

/// Serves objects from a local directory.
///
/// Keys are interpreted as relative paths under `root`. Keys that are
/// absolute or climb out of the root with `..` are rejected before touching
/// the filesystem.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Directory this store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidKey {
                        key: key.to_string(),
                        reason: "key must stay inside the storage root".to_string(),
                    });
                }
            }
        }
        if resolved == self.root {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "key is empty".to_string(),
            });
        }
        Ok(resolved)
    }
}

impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let path = self.resolve(key)?;
        read_file(key, &path).await
    }

    async fn get_object_within(
        &self,
        key: &str,
        max_size: u64,
    ) -> Result<StoredObject, StorageError> {
        let path = self.resolve(key)?;
        let size = fs::metadata(&path).await.map_err(|e| io_error(key, &e))?.len();
        if size > max_size {
            return Err(StorageError::SizeLimitExceeded {
                key: key.to_string(),
                size,
                limit: max_size,
            });
        }
        read_file(key, &path).await
    }
}

async fn read_file(key: &str, path: &Path) -> Result<StoredObject, StorageError> {
    let body = fs::read(path).await.map_err(|e| io_error(key, &e))?;
    Ok(StoredObject {
        content_length: Some(body.len() as u64),
        body: Some(Bytes::from(body)),
        content_type: guess_content_type(path).map(str::to_string),
    })
}

fn io_error(key: &str, err: &std::io::Error) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound {
            key: key.to_string(),
        },
        _ => StorageError::Io {
            key: key.to_string(),
            message: err.to_string(),
        },
    }
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" | "hbs" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime)
}
