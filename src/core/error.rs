//! Error handling for renderd
//!
//! This module provides the error taxonomy shared by the render pipeline, the
//! request boundary and the CLI. The error system follows two principles:
//! 1. **Strongly-typed errors** so the boundary can map failures to status codes
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`RenderdError`] - Enumerated error types for every failure the service reports
//! - [`ErrorKind`] - The coarse taxonomy a request boundary sees
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Examples
//!
//! ```rust,no_run
//! use renderd::core::{ErrorKind, RenderdError, user_friendly_error};
//!
//! let error = RenderdError::UnsafeContent { script_count: 1 };
//! assert_eq!(error.kind(), ErrorKind::UnsafeContent);
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Coarse failure taxonomy exposed to request boundaries.
///
/// Every [`RenderdError`] belongs to exactly one kind. Boundaries translate
/// kinds into transport-specific status codes; the pipeline never retries
/// any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Storage read failed, object absent, timed out, or too large
    TemplateUnavailable,
    /// The document contains executable script elements
    UnsafeContent,
    /// The templating engine rejected the document's syntax
    CompileError,
    /// The templating engine failed during variable substitution
    RenderError,
    /// Caller input violates the boundary's contract
    InvalidRequest,
    /// Configuration or other service-side failure outside the pipeline
    Internal,
}

impl ErrorKind {
    /// Stable identifier used in logs and error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TemplateUnavailable => "template_unavailable",
            Self::UnsafeContent => "unsafe_content",
            Self::CompileError => "compile_error",
            Self::RenderError => "render_error",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
        }
    }

    /// Whether the failure is attributed to the caller rather than the service.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(self, Self::InvalidRequest)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for renderd operations
///
/// Each variant corresponds to one failure mode of the render pipeline or the
/// surfaces around it. Variants carry enough context for logs and CLI output;
/// HTTP callers only ever see the opaque description produced by the
/// boundary.
#[derive(Error, Debug, Clone)]
pub enum RenderdError {
    /// The template could not be fetched
    ///
    /// Not-found, too-large, timed-out and transport failures are deliberately
    /// collapsed into this single variant. The `reason` is for logs only.
    #[error("Template not found or inaccessible: {key}")]
    TemplateUnavailable {
        /// Template key that was requested
        key: String,
        /// Underlying storage failure, kept for diagnostics
        reason: String,
    },

    /// The document contains one or more `<script>` elements
    #[error("Template contains unsafe script tags")]
    UnsafeContent {
        /// Number of script elements found in the parsed tree
        script_count: usize,
    },

    /// Tera could not parse the validated document
    #[error("Failed to compile template '{key}': {message}")]
    CompileError {
        /// Template key being compiled
        key: String,
        /// Parser message from the engine
        message: String,
    },

    /// Tera failed while substituting variables
    #[error("Failed to render template '{key}': {message}")]
    RenderError {
        /// Template key being rendered
        key: String,
        /// Engine message
        message: String,
    },

    /// Caller-supplied key or variables are malformed
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Any other failure surfaced through the CLI
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl RenderdError {
    /// The taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TemplateUnavailable {
                ..
            } => ErrorKind::TemplateUnavailable,
            Self::UnsafeContent {
                ..
            } => ErrorKind::UnsafeContent,
            Self::CompileError {
                ..
            } => ErrorKind::CompileError,
            Self::RenderError {
                ..
            } => ErrorKind::RenderError,
            Self::InvalidRequest {
                ..
            } => ErrorKind::InvalidRequest,
            Self::ConfigError {
                ..
            }
            | Self::Other {
                ..
            } => ErrorKind::Internal,
        }
    }

    /// Shorthand for building an [`RenderdError::InvalidRequest`].
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Shorthand for building a [`RenderdError::ConfigError`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`RenderdError`] with an optional suggestion and additional details
/// for display in the terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying renderd error
    pub error: RenderdError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: RenderdError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Walks the error chain looking for a [`RenderdError`]; anything else is
/// reported as [`RenderdError::Other`] carrying the rest of the chain as
/// details.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(renderd_error) = cause.downcast_ref::<RenderdError>() {
            return create_error_context(renderd_error);
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(RenderdError::config(toml_error.to_string()))
            .with_suggestion("Check the TOML syntax in your renderd config file");
    }

    let details = error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join(": ");
    let mut ctx = ErrorContext::new(RenderdError::Other {
        message: error.to_string(),
    });
    if !details.is_empty() {
        ctx = ctx.with_details(details);
    }
    ctx
}

fn create_error_context(error: &RenderdError) -> ErrorContext {
    let ctx = ErrorContext::new(error.clone());
    match error {
        RenderdError::TemplateUnavailable {
            reason,
            ..
        } => ctx
            .with_details(reason.clone())
            .with_suggestion("Check the storage endpoint, bucket and template key"),
        RenderdError::UnsafeContent {
            script_count,
        } => ctx
            .with_details(format!("Found {script_count} <script> element(s) in the document"))
            .with_suggestion("Remove all <script> elements from the template"),
        RenderdError::CompileError {
            ..
        } => ctx.with_suggestion("Check the template syntax for unbalanced {{ }} or {% %} tags"),
        RenderdError::RenderError {
            ..
        } => ctx.with_suggestion("Check that the variables are a JSON object matching the template"),
        RenderdError::InvalidRequest {
            ..
        } => ctx.with_suggestion(
            "Template keys must start with 'template' and end with '.hbs'; variables must be a JSON object",
        ),
        RenderdError::ConfigError {
            ..
        } => ctx.with_suggestion("Check your renderd config file and RENDERD_* environment variables"),
        RenderdError::Other {
            ..
        } => ctx,
    }
}
