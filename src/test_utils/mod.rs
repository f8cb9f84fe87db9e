//! Test utilities for renderd
//!
//! Helpers shared by unit tests and the integration suite: an in-memory
//! object store that counts and records reads, a validator that records its
//! inputs, and one-time logging setup.
//!
//! # Example
//!
//! ```rust,ignore
//! use renderd::storage::TemplateFetcher;
//! use renderd::test_utils::InMemoryObjectStore;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let store = InMemoryObjectStore::new().with_text("template/a.hbs", "<p>{{ name }}</p>");
//! let fetcher = TemplateFetcher::new(store.clone(), 1024, Duration::from_secs(1));
//! fetcher.fetch("template/a.hbs").await.unwrap();
//! assert_eq!(store.call_count(), 1);
//! # }
//! ```

mod store;
mod validator;

pub use store::InMemoryObjectStore;
pub use validator::RecordingValidator;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=renderd=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
