//! Request boundary: input validation, rendering and HTTP-shaped replies.
//!
//! Everything here is transport-agnostic. [`handle_render_request`] turns a
//! validated [`RenderRequest`] into a [`RenderResponse`]; [`HttpReply`] maps
//! that outcome onto a status code, headers and body that any HTTP layer can
//! send as-is. The axum server in [`crate::server`] is one such layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::constants::{CONTENT_SECURITY_POLICY, TEMPLATE_KEY_PREFIX, TEMPLATE_KEY_SUFFIX};
use crate::core::{ErrorKind, RenderdError};
use crate::pipeline::RenderPipeline;
use crate::storage::{ObjectStore, has_parent_segment};

/// A template key that passed boundary validation.
///
/// Valid keys start with `template`, end with `.hbs` and contain no `..`
/// path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey(String);

impl TemplateKey {
    /// Validate `raw` as a template key.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::InvalidRequest`] if the key is malformed.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RenderdError> {
        let raw = raw.into();
        if !raw.starts_with(TEMPLATE_KEY_PREFIX) {
            return Err(RenderdError::invalid_request(format!(
                "templateKey must start with '{TEMPLATE_KEY_PREFIX}'"
            )));
        }
        if !raw.ends_with(TEMPLATE_KEY_SUFFIX) {
            return Err(RenderdError::invalid_request(format!(
                "templateKey must end with '{TEMPLATE_KEY_SUFFIX}'"
            )));
        }
        if has_parent_segment(&raw) {
            return Err(RenderdError::invalid_request("templateKey must not contain '..'"));
        }
        Ok(Self(raw))
    }

    /// The key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TemplateKey {
    type Err = RenderdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemplateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Object key for a path requested under `/assets/`.
///
/// The path is already percent-decoded by the HTTP layer, so `..%2F` arrives
/// here as `../` and is rejected like a literal one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    /// Key prefix every asset lives under.
    pub const PREFIX: &'static str = "assets/";

    /// Validate a requested asset path and prefix it with `assets/`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::InvalidRequest`] if the path is empty or has a
    /// `..` segment.
    pub fn parse(path: &str) -> Result<Self, RenderdError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(RenderdError::invalid_request("asset path is empty"));
        }
        if has_parent_segment(path) {
            return Err(RenderdError::invalid_request("asset path must not contain '..'"));
        }
        Ok(Self(format!("{}{path}", Self::PREFIX)))
    }

    /// The object key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// An inbound render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Storage key of the template document
    pub template_key: String,
    /// Values substituted into the template; defaults to `{}`
    #[serde(default = "empty_object")]
    pub variables: serde_json::Value,
}

impl RenderRequest {
    /// Build a request with no variables.
    pub fn new(template_key: impl Into<String>) -> Self {
        Self {
            template_key: template_key.into(),
            variables: empty_object(),
        }
    }

    /// Attach variables.
    #[must_use]
    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }

    /// Check the key and variables shape, returning the parsed key.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::InvalidRequest`] for a malformed key or
    /// variables that are not a JSON object.
    pub fn validate(&self) -> Result<TemplateKey, RenderdError> {
        let key = TemplateKey::parse(self.template_key.as_str())?;
        if !self.variables.is_object() {
            return Err(RenderdError::invalid_request("variables must be a JSON object"));
        }
        Ok(key)
    }
}

/// Successful render output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    /// Rendered document
    pub html: String,
}

/// Validate `request` and render it through `pipeline`.
///
/// # Errors
///
/// Returns [`RenderdError::InvalidRequest`] for malformed input, otherwise
/// whatever the pipeline reports.
pub async fn handle_render_request<S: ObjectStore>(
    pipeline: &RenderPipeline<S>,
    request: RenderRequest,
) -> Result<RenderResponse, RenderdError> {
    let key = request.validate()?;
    let html = pipeline.render(key.as_str(), &request.variables).await?;
    Ok(RenderResponse {
        html,
    })
}

/// Parse a JSON request body and render it, always producing a reply.
///
/// An empty or unparseable body is an invalid request.
pub async fn handle_json_body<S: ObjectStore>(pipeline: &RenderPipeline<S>, body: &str) -> HttpReply {
    let result = match parse_json_body(body) {
        Ok(request) => handle_render_request(pipeline, request).await,
        Err(err) => Err(err),
    };
    HttpReply::from_result(result)
}

/// Render from query-string style inputs.
///
/// `variables` is JSON text; when absent the template gets `{}`.
pub async fn handle_query<S: ObjectStore>(
    pipeline: &RenderPipeline<S>,
    template_key: Option<&str>,
    variables: Option<&str>,
) -> HttpReply {
    let result = match query_request(template_key, variables) {
        Ok(request) => handle_render_request(pipeline, request).await,
        Err(err) => Err(err),
    };
    HttpReply::from_result(result)
}

fn query_request(
    template_key: Option<&str>,
    variables: Option<&str>,
) -> Result<RenderRequest, RenderdError> {
    let key = template_key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| RenderdError::invalid_request("missing templateKey parameter"))?;
    let variables = match variables {
        Some(raw) => parse_variables(raw)?,
        None => empty_object(),
    };
    Ok(RenderRequest::new(key).with_variables(variables))
}

/// Parse a JSON request body into a [`RenderRequest`].
///
/// # Errors
///
/// Returns [`RenderdError::InvalidRequest`] if the body is empty or is not a
/// request object.
pub fn parse_json_body(body: &str) -> Result<RenderRequest, RenderdError> {
    if body.trim().is_empty() {
        return Err(RenderdError::invalid_request("request body is empty"));
    }
    serde_json::from_str(body)
        .map_err(|e| RenderdError::invalid_request(format!("request body is not valid JSON: {e}")))
}

/// Parse a JSON variables document.
///
/// # Errors
///
/// Returns [`RenderdError::InvalidRequest`] if `raw` is not valid JSON.
pub fn parse_variables(raw: &str) -> Result<serde_json::Value, RenderdError> {
    serde_json::from_str(raw)
        .map_err(|e| RenderdError::invalid_request(format!("variables are not valid JSON: {e}")))
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    details: String,
}

/// An HTTP reply ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Status code
    pub status: u16,
    /// Response headers in send order
    pub headers: Vec<(&'static str, String)>,
    /// Response body
    pub body: String,
}

impl HttpReply {
    /// A `200` HTML reply with the security headers.
    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type", "text/html".to_string()),
                ("Content-Security-Policy", CONTENT_SECURITY_POLICY.to_string()),
                ("X-Content-Type-Options", "nosniff".to_string()),
            ],
            body,
        }
    }

    /// A JSON error reply.
    ///
    /// Invalid requests get `400 Invalid input format`; everything else gets
    /// `500 Internal server error`. The details carry the error message, which
    /// never includes storage internals.
    pub fn error(err: &RenderdError) -> Self {
        let (status, label) = if err.kind() == ErrorKind::InvalidRequest {
            (400, "Invalid input format")
        } else {
            (500, "Internal server error")
        };

        let body = serde_json::to_string(&ErrorBody {
            error: label,
            details: err.to_string(),
        })
        .unwrap_or_else(|_| format!("{{\"error\":\"{label}\"}}"));

        Self {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body,
        }
    }

    /// Map a render outcome onto a reply.
    pub fn from_result(result: Result<RenderResponse, RenderdError>) -> Self {
        match result {
            Ok(response) => Self::html(response.html),
            Err(err) => {
                if err.kind().is_client_error() {
                    debug!("Rejected render request: {}", err);
                } else {
                    warn!("Render request failed: {}", err);
                }
                Self::error(&err)
            }
        }
    }

    /// First header value with `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
