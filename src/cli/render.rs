//! Render a single template from the command line.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common;
use crate::handler::{self, RenderRequest};

/// Command to render a template.
///
/// # Examples
///
/// ```bash
/// renderd render template/welcome.hbs --vars '{"name": "Ada"}'
/// renderd render template/welcome.hbs --vars-file vars.json --output out.html
/// ```
#[derive(Args)]
pub struct RenderCommand {
    /// Template key, e.g. `template/welcome.hbs`
    key: String,

    /// Variables as a JSON object
    #[arg(long, conflicts_with = "vars_file")]
    vars: Option<String>,

    /// Read variables from a JSON file
    #[arg(long, value_name = "FILE")]
    vars_file: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Serve templates from this directory instead of the configured store
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
}

impl RenderCommand {
    /// Execute the render command.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let variables = match (&self.vars, &self.vars_file) {
            (Some(raw), _) => handler::parse_variables(raw)?,
            (None, Some(path)) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read variables from {}", path.display()))?;
                handler::parse_variables(&raw)?
            }
            (None, None) => serde_json::json!({}),
        };

        let config = common::load_config(config_path, self.root).await?;
        let pipeline = common::build_pipeline(&config)?;

        let request = RenderRequest::new(self.key).with_variables(variables);
        let response = handler::handle_render_request(&pipeline, request).await?;

        match self.output {
            Some(path) => {
                tokio::fs::write(&path, &response.html)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("{} Wrote {}", "✓".green(), path.display());
            }
            None => println!("{}", response.html),
        }
        Ok(())
    }
}
