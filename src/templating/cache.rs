//! Time-to-live cache of compiled renderers.
//!
//! This module keeps compiled templates between requests so a template is
//! fetched, validated and compiled at most once per time-to-live window.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use super::engine::CompiledTemplate;

/// A cached renderer and the instant it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    renderer: Arc<CompiledTemplate>,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Cache of compiled renderers keyed by template key.
///
/// # Expiry
///
/// An entry stored at `T` with time-to-live `L` is returned for reads before
/// `T + L`. A read at or after `T + L` evicts the entry and reports a miss.
/// Expiry is only evaluated on read; there is no background sweep.
///
/// # Overwrites
///
/// [`set`](Self::set) always replaces whatever is stored for the key, fresh
/// or not, and restarts its time-to-live.
///
/// # Concurrency
///
/// Backed by a [`DashMap`], so each `get` and `set` is atomic on its own.
/// Nothing spans the two: concurrent misses for one key may both compile, and
/// the later `set` wins. Renderers for the same key are interchangeable, so
/// this only costs duplicate work.
///
/// # Capacity
///
/// Unbounded. Entries leave only by expiring on read or by [`clear`](Self::clear).
#[derive(Debug)]
pub struct RendererCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl RendererCache {
    /// Create an empty cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a fresh renderer, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<CompiledTemplate>> {
        self.get_at(key, Instant::now())
    }

    /// Store a renderer, replacing any existing entry.
    pub fn set(&self, key: &str, renderer: Arc<CompiledTemplate>) {
        self.set_at(key, renderer, Instant::now());
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<Arc<CompiledTemplate>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now, self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Renderer cache hit for '{}'", key);
                return Some(Arc::clone(&entry.renderer));
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Renderer cache miss for '{}'", key);
            return None;
        }

        // Re-check under the shard lock so a concurrent refresh survives.
        let ttl = self.ttl;
        self.entries.remove_if(key, |_, entry| entry.is_expired(now, ttl));
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Renderer cache entry for '{}' expired", key);
        None
    }

    pub(crate) fn set_at(&self, key: &str, renderer: Arc<CompiledTemplate>, now: Instant) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                renderer,
                created_at: now,
            },
        );
    }

    /// Number of stored entries, including ones that have expired but not
    /// been read since.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry is stored for `key`, without evaluating expiry.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics as `(hits, misses)`.
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    /// Calculate hit rate as a percentage
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let (hits, misses) = self.stats();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}
