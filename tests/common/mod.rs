//! Common test utilities for renderd integration tests

// Not every test file uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// The document used by the reference render scenarios.
pub const PROFILE_TEMPLATE: &str = "<h1>{{title}}</h1><p>{{user.name}} ({{user.role}})</p>";

/// A temporary directory laid out as a local template store.
pub struct TemplateRoot {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    store_dir: PathBuf,
    work_dir: PathBuf,
}

impl TemplateRoot {
    /// Create an empty store and a separate working directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store_dir = temp_dir.path().join("store");
        let work_dir = temp_dir.path().join("work");
        fs::create_dir_all(&store_dir)?;
        fs::create_dir_all(&work_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            store_dir,
            work_dir,
        })
    }

    /// Directory served as the object store root.
    pub fn store_path(&self) -> &Path {
        &self.store_dir
    }

    /// Scratch directory for config files and outputs.
    pub fn work_path(&self) -> &Path {
        &self.work_dir
    }

    /// Write an object under `key`, creating parent directories.
    pub fn write_object(&self, key: &str, content: &str) -> Result<PathBuf> {
        let path = self.store_dir.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a file into the working directory.
    pub fn write_work_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.work_dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Run the renderd binary with the store root and an isolated config path.
    pub fn run_renderd(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_renderd"))
            .args(args)
            .current_dir(&self.work_dir)
            .env("RENDERD_CONFIG", self.work_dir.join("absent.toml"))
            .env("RENDERD_STORAGE_ROOT", &self.store_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run renderd command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStderr: {}",
            self.code, self.stderr
        );
        self
    }

    /// Assert the command failed
    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "Command unexpectedly succeeded\nStdout: {}", self.stdout);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
