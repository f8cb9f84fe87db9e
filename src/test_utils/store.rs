use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::storage::{ObjectStore, StorageError, StoredObject};

#[derive(Debug, Default)]
struct Shared {
    objects: DashMap<String, StoredObject>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

/// An [`ObjectStore`] backed by a map, for tests.
///
/// Clones share their objects and counters, so a test can hand one clone to
/// the code under test and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    shared: Arc<Shared>,
    delay: Option<Duration>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a UTF-8 object.
    #[must_use]
    pub fn with_text(self, key: &str, text: &str) -> Self {
        self.insert(key, StoredObject::from_body(text.to_string()));
        self
    }

    /// Add an object exactly as given, including odd lengths or a missing body.
    #[must_use]
    pub fn with_object(self, key: &str, object: StoredObject) -> Self {
        self.insert(key, object);
        self
    }

    /// Sleep for `delay` before answering every read.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Insert or replace an object. Visible to every clone.
    pub fn insert(&self, key: &str, object: StoredObject) {
        self.shared.objects.insert(key.to_string(), object);
    }

    /// Remove an object.
    pub fn remove(&self, key: &str) {
        self.shared.objects.remove(key);
    }

    /// Number of reads so far.
    pub fn call_count(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    /// Keys read so far, in order.
    pub fn requested_keys(&self) -> Vec<String> {
        self.shared.requested.lock().map(|keys| keys.clone()).unwrap_or_default()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut keys) = self.shared.requested.lock() {
            keys.push(key.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.shared.objects.get(key).map(|entry| entry.value().clone()).ok_or_else(|| {
            StorageError::NotFound {
                key: key.to_string(),
            }
        })
    }
}
