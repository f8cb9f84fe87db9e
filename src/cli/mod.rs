//! Command-line interface for renderd.
//!
//! # Available Commands
//!
//! - `render` - Render one template to stdout or a file
//! - `validate` - Run the safety validator over a local file
//! - `serve` - Expose the render pipeline over HTTP
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Suppress all logging
//! - `--config` - Path to a config file (see [`crate::config`])
//!
//! Logs go to stderr so rendered output on stdout can be piped.
//!
//! # Example
//!
//! ```bash
//! renderd render template/welcome.hbs --vars '{"name": "Ada"}' --root ./fixtures
//! renderd validate ./fixtures/template/welcome.hbs
//! renderd serve --bind 0.0.0.0:8080
//! ```

pub mod common;
mod render;
mod serve;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use render::RenderCommand;
pub use serve::ServeCommand;
pub use validate::ValidateCommand;

/// Runtime configuration for CLI execution.
///
/// Built from the global flags so commands never read them from the parser
/// directly.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for renderd's own targets. `None` disables logging.
    pub log_level: Option<String>,

    /// Explicit config file path from `--config`.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a new CLI configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Install the stderr tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the level from the flags. Calling this
    /// more than once is harmless.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("renderd={level}")));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for renderd.
#[derive(Parser)]
#[command(
    name = "renderd",
    about = "Render HTML templates from object storage",
    version,
    author,
    long_about = "renderd fetches HTML templates from object storage, rejects any that carry script tags, \
                  completes their document structure and renders them with caller-supplied variables."
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with variables
    Render(RenderCommand),

    /// Check a local template document for unsafe content
    Validate(ValidateCommand),

    /// Serve the render pipeline over HTTP
    Serve(ServeCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute(config.config_path).await,
            Commands::Validate(cmd) => cmd.execute().await,
            Commands::Serve(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
