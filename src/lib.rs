//! renderd - render HTML templates fetched from object storage
//!
//! renderd turns a template key and a set of variables into a complete HTML
//! document. Templates live in a key-addressed object store and are treated as
//! untrusted: any document carrying a `<script>` element is rejected before it
//! is ever compiled.
//!
//! # Render Flow
//!
//! ```text
//! key ──► RendererCache ──hit──────────────────────────────► render ──► HTML
//!              │ miss                                           ▲
//!              ▼                                                │
//!        TemplateFetcher ──► SafetyValidator ──► CompiledTemplate ──► cache
//!        (size, timeout)     (scripts, repair)     (Tera)
//! ```
//!
//! Compiled renderers are cached per key for a fixed time-to-live, so a hot
//! template is fetched, validated and compiled once per window.
//!
//! # Core Modules
//!
//! - [`pipeline`] - The cache → fetch → validate → compile → render flow
//! - [`storage`] - Object store trait, HTTP and local backends, bounded fetcher
//! - [`validator`] - Script rejection and document structure completion
//! - [`templating`] - Tera compilation and the renderer cache
//! - [`handler`] - Request validation and HTTP-shaped replies
//!
//! ## Supporting Modules
//!
//! - [`cli`] - `render`, `validate` and `serve` commands
//! - [`server`] - axum routes over the pipeline
//! - [`config`] - TOML config file with environment overrides
//! - [`core`] - Error types and user-facing error formatting
//! - [`constants`] - Limits, defaults and header values
//!
//! # Example
//!
//! ```rust,no_run
//! use renderd::config::ServiceConfig;
//! use renderd::pipeline::RenderPipeline;
//! use renderd::storage::LocalObjectStore;
//! use serde_json::json;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let pipeline = RenderPipeline::from_config(LocalObjectStore::new("./fixtures"), &config);
//!
//! let html = pipeline.render("template/welcome.hbs", &json!({"name": "Ada"})).await?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod handler;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod templating;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
