//! Run the HTTP server.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::common;
use crate::server;

/// Command to serve renders over HTTP.
#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind, overriding `server.bind`
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Serve templates from this directory instead of the configured store
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = common::load_config(config_path, self.root).await?;
        let pipeline = common::build_pipeline(&config)?;
        let bind = self.bind.unwrap_or_else(|| config.server.bind.clone());

        info!(
            "Cache ttl {:?}, max template size {} bytes",
            config.cache_ttl(),
            config.max_template_size
        );
        server::serve(pipeline, &bind).await
    }
}
