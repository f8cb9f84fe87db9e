//! Service configuration for renderd.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables, so the same binary can run from a checked-in config
//! during development and from plain environment variables in a deployment.
//!
//! # File Location
//!
//! - `--config <path>` on the command line, or
//! - the `RENDERD_CONFIG` environment variable, or
//! - `~/.renderd/config.toml` (`%LOCALAPPDATA%\renderd\config.toml` on Windows)
//!
//! A missing file is not an error; defaults are used instead.
//!
//! # File Format
//!
//! ```toml
//! max_template_size = 1048576   # bytes
//! cache_ttl_secs = 300
//! fetch_timeout_ms = 2000
//!
//! [storage]
//! bucket = "my-templates"
//! endpoint = "https://objects.example.com"
//! # root = "./fixtures"        # serve from a local directory instead
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```
//!
//! # Environment Overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `TEMPLATE_BUCKET` | `storage.bucket` |
//! | `RENDERD_STORAGE_ENDPOINT` | `storage.endpoint` |
//! | `RENDERD_STORAGE_ROOT` | `storage.root` |
//! | `RENDERD_MAX_TEMPLATE_SIZE` | `max_template_size` |
//! | `RENDERD_CACHE_TTL_SECS` | `cache_ttl_secs` |
//! | `RENDERD_FETCH_TIMEOUT_MS` | `fetch_timeout_ms` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_CACHE_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_TEMPLATE_SIZE,
};
use crate::core::RenderdError;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "RENDERD_CONFIG";

const fn default_max_template_size() -> u64 {
    DEFAULT_MAX_TEMPLATE_SIZE
}

const fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

const fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_millis() as u64
}

fn default_bind() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

/// Top-level configuration consumed by the render pipeline and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Byte ceiling for fetched template documents.
    #[serde(default = "default_max_template_size")]
    pub max_template_size: u64,

    /// Seconds before a cached renderer is considered stale.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Milliseconds before a storage read is abandoned.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Where templates are read from.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP listener settings for `renderd serve`.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Object storage settings.
///
/// Exactly one of `endpoint` (remote HTTP object store) or `root` (local
/// directory) is used; `root` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket or namespace that template keys live under.
    #[serde(default)]
    pub bucket: String,

    /// Base URL of an HTTP object store, e.g. `https://objects.example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Local directory used instead of a remote store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_template_size: default_max_template_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Renderer time-to-live as a [`Duration`].
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Storage read timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Load configuration from an optional path, then apply environment overrides.
    ///
    /// When `path` is `None`, `RENDERD_CONFIG` and then the default location
    /// are tried. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// an environment override holds an invalid number.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(|| Self::default_path().ok());

        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path).await?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Default config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("renderd")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".renderd")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Taking the lookup as a closure keeps this testable without touching the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::ConfigError`] when a numeric variable does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), RenderdError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("TEMPLATE_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(endpoint) = lookup("RENDERD_STORAGE_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(root) = lookup("RENDERD_STORAGE_ROOT") {
            self.storage.root = Some(PathBuf::from(root));
        }
        if let Some(value) = lookup("RENDERD_MAX_TEMPLATE_SIZE") {
            self.max_template_size = parse_env("RENDERD_MAX_TEMPLATE_SIZE", &value)?;
        }
        if let Some(value) = lookup("RENDERD_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_env("RENDERD_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("RENDERD_FETCH_TIMEOUT_MS") {
            self.fetch_timeout_ms = parse_env("RENDERD_FETCH_TIMEOUT_MS", &value)?;
        }
        Ok(())
    }

    /// Check that the configuration can drive a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::ConfigError`] for a zero size ceiling, a zero
    /// fetch timeout, or storage with neither an endpoint nor a root.
    pub fn validate(&self) -> Result<(), RenderdError> {
        if self.max_template_size == 0 {
            return Err(RenderdError::config("max_template_size must be greater than zero"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(RenderdError::config("fetch_timeout_ms must be greater than zero"));
        }
        if self.storage.endpoint.is_none() && self.storage.root.is_none() {
            return Err(RenderdError::config(
                "storage needs either an endpoint or a local root directory",
            ));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, RenderdError> {
    value
        .trim()
        .parse()
        .map_err(|_| RenderdError::config(format!("{name} must be a number, got '{value}'")))
}
