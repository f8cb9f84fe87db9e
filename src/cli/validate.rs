//! Check a local template document with the safety validator.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::validator::{MarkupValidator, SafetyValidator};

/// Command to validate a template document on disk.
///
/// Prints the completed document on success, or exits non-zero if the
/// document would be rejected.
#[derive(Args)]
pub struct ValidateCommand {
    /// Path to the template document
    file: PathBuf,

    /// Only report the verdict
    #[arg(long)]
    check: bool,
}

impl ValidateCommand {
    /// Execute the validate command.
    pub async fn execute(self) -> Result<()> {
        let raw = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        let document = SafetyValidator::new().validate(&raw)?;

        if self.check {
            println!("{} {} is safe", "✓".green(), self.file.display());
        } else {
            println!("{document}");
        }
        Ok(())
    }
}
