//! Helpers shared by commands that build a render pipeline.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::pipeline::RenderPipeline;
use crate::storage::ConfiguredStore;

/// Load configuration, let `root` override the storage root, and validate.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or does not describe a
/// usable store.
pub async fn load_config(path: Option<PathBuf>, root: Option<PathBuf>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load_with_optional(path).await?;
    if let Some(root) = root {
        config.storage.root = Some(root);
    }
    config.validate()?;
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

/// Build a shared pipeline over the configured store.
///
/// # Errors
///
/// Returns an error if the storage client cannot be constructed.
pub fn build_pipeline(config: &ServiceConfig) -> Result<Arc<RenderPipeline<ConfiguredStore>>> {
    let store = ConfiguredStore::from_config(config).context("Failed to set up template storage")?;
    Ok(Arc::new(RenderPipeline::from_config(store, config)))
}
