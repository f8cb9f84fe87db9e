//! The render pipeline: cache lookup, fetch, validate, compile, render.
//!
//! One [`RenderPipeline`] serves every request in a process. A render is a
//! single linear pass:
//!
//! 1. Look the key up in the [`RendererCache`].
//! 2. On a hit, render with the cached renderer.
//! 3. On a miss, fetch the document, validate it, compile it, store the
//!    renderer in the cache, then render.
//!
//! Any failure ends the render with no output. There are no retries. Once a
//! document has been fetched, validated and compiled, the cache is updated
//! before rendering, so a failing render still leaves a usable entry for the
//! next request.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::core::RenderdError;
use crate::storage::{ObjectStore, TemplateFetcher};
use crate::templating::{CompiledTemplate, RendererCache};
use crate::validator::{MarkupValidator, SafetyValidator};

/// Orchestrates the render of a template key with caller variables.
///
/// The cache is passed in rather than created here so several pipelines (or
/// tests) can decide whether they share one.
pub struct RenderPipeline<S> {
    fetcher: TemplateFetcher<S>,
    validator: Arc<dyn MarkupValidator>,
    cache: Arc<RendererCache>,
}

impl<S: ObjectStore> RenderPipeline<S> {
    /// Create a pipeline using the [`SafetyValidator`].
    pub fn new(fetcher: TemplateFetcher<S>, cache: Arc<RendererCache>) -> Self {
        Self {
            fetcher,
            validator: Arc::new(SafetyValidator::new()),
            cache,
        }
    }

    /// Create a pipeline for `store` with limits and time-to-live from `config`.
    pub fn from_config(store: S, config: &ServiceConfig) -> Self {
        let fetcher = TemplateFetcher::new(store, config.max_template_size, config.fetch_timeout());
        Self::new(fetcher, Arc::new(RendererCache::new(config.cache_ttl())))
    }

    /// Replace the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn MarkupValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// The renderer cache this pipeline reads and populates.
    pub fn cache(&self) -> &RendererCache {
        &self.cache
    }

    /// The fetcher used on cache misses.
    pub const fn fetcher(&self) -> &TemplateFetcher<S> {
        &self.fetcher
    }

    /// Render `key` with `variables`.
    ///
    /// # Errors
    ///
    /// - [`RenderdError::TemplateUnavailable`] if the document cannot be fetched
    /// - [`RenderdError::UnsafeContent`] if it contains script elements
    /// - [`RenderdError::CompileError`] if its template syntax is invalid
    /// - [`RenderdError::RenderError`] if substitution fails
    pub async fn render(
        &self,
        key: &str,
        variables: &serde_json::Value,
    ) -> Result<String, RenderdError> {
        let started = Instant::now();

        let renderer = match self.cache.get(key) {
            Some(renderer) => renderer,
            None => self.load(key).await?,
        };

        let html = renderer.render(variables)?;
        debug!("Rendered '{}' in {:?} ({} bytes)", key, started.elapsed(), html.len());
        Ok(html)
    }

    async fn load(&self, key: &str) -> Result<Arc<CompiledTemplate>, RenderdError> {
        let raw = self.fetcher.fetch(key).await?;
        let document = self.validator.validate(&raw)?;
        let renderer = Arc::new(CompiledTemplate::compile(key, &document)?);

        self.cache.set(key, Arc::clone(&renderer));
        info!("Cached renderer for '{}' ({} cached)", key, self.cache.len());
        Ok(renderer)
    }
}
