//! Global constants used throughout the renderd codebase.
//!
//! This module contains size limits, timeout durations, and naming rules that
//! are shared between the configuration layer, the request boundary, and the
//! render pipeline. Defining them centrally keeps the defaults discoverable.

use std::time::Duration;

/// Default maximum size of a fetched template document (1 MB).
///
/// Documents whose reported length exceeds this ceiling are rejected before
/// any parsing or compilation is attempted.
pub const DEFAULT_MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

/// Default time-to-live for compiled renderers (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default timeout for a single storage read (2 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default listen address for `renderd serve`.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Required prefix of every template key accepted at the boundary.
pub const TEMPLATE_KEY_PREFIX: &str = "template";

/// Required suffix of every template key accepted at the boundary.
pub const TEMPLATE_KEY_SUFFIX: &str = ".hbs";

/// Content-Security-Policy sent with every rendered page.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'";

/// Document type declaration inserted by the validator when absent.
pub const DOCTYPE_MARKER: &str = "<!DOCTYPE html>";
