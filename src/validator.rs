//! Safety validation and structural repair of template markup.
//!
//! Template documents come from storage that the service does not control, so
//! every document is checked before it is compiled:
//!
//! 1. The markup is parsed with an HTML5 parser and rejected outright if any
//!    `<script>` element appears anywhere in the tree. The check runs twice:
//!    on the source as stored, and on the source with every template tag
//!    removed, so `<scr{{x}}ipt>` cannot assemble a script at render time.
//!    Element names that contain a template tag (`<{{ tag }}>`) are rejected
//!    for the same reason. There is no strip-and-continue mode; callers never
//!    see partially sanitized content.
//! 2. Missing document structure is completed at the string level, in this
//!    order: doctype, `<html>` root, `<head>`, `<body>`. Each step looks for
//!    markers the previous step may have inserted, so the order matters.
//!
//! Safe but malformed markup is repaired, never rejected. Completing an
//! already-complete document returns it unchanged.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::constants::DOCTYPE_MARKER;
use crate::core::RenderdError;

static DOCTYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype\s+html[^>]*>").expect("doctype pattern is valid"));
static HTML_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html(\s[^>]*)?>").expect("html pattern is valid"));
static HTML_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("html close pattern is valid"));
static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(\s[^>]*)?>").expect("head pattern is valid"));
static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("head close pattern is valid"));
static BODY_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(\s[^>]*)?>").expect("body pattern is valid"));

static TEMPLATE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}|\{#.*?#\}").expect("template tag pattern is valid")
});
static DYNAMIC_TAG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z0-9-]*(?:\{\{|\{%)").expect("dynamic tag pattern is valid")
});

/// Checks untrusted markup before it is compiled.
///
/// The render pipeline only depends on this trait, which lets tests observe
/// exactly what the pipeline hands to validation.
pub trait MarkupValidator: Send + Sync {
    /// Validate `raw` and return the repaired document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::UnsafeContent`] if the document contains
    /// executable script elements.
    fn validate(&self, raw: &str) -> Result<String, RenderdError>;
}

/// The production validator: script rejection plus structural completion.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyValidator;

impl SafetyValidator {
    /// Create a validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Number of `<script>` elements in the parsed document.
    ///
    /// Counts scripts in every namespace, so `<svg><script>` is caught too.
    #[must_use]
    pub fn count_scripts(raw: &str) -> usize {
        let document = Html::parse_document(raw);
        document
            .tree
            .values()
            .filter(|node| {
                node.as_element().is_some_and(|element| element.name().eq_ignore_ascii_case("script"))
            })
            .count()
    }

    /// Number of script elements the document could produce once rendered.
    ///
    /// Counts scripts in the source as stored and in the source with template
    /// tags removed, keeping the larger count, then adds one for every element
    /// whose name is built from a template tag.
    #[must_use]
    pub fn count_unsafe_elements(raw: &str) -> usize {
        let stored = Self::count_scripts(raw);
        let untagged = Self::count_scripts(&TEMPLATE_TAG_RE.replace_all(raw, ""));
        stored.max(untagged) + DYNAMIC_TAG_NAME_RE.find_iter(raw).count()
    }

    /// Complete missing doctype, root, head and body markers.
    ///
    /// This is pure string surgery; the input is not re-serialized.
    #[must_use]
    pub fn complete_structure(raw: &str) -> String {
        let mut html = raw.to_string();

        if !DOCTYPE_RE.is_match(&html) {
            html = format!("{DOCTYPE_MARKER}\n{html}");
        }

        if !HTML_OPEN_RE.is_match(&html) {
            let at = DOCTYPE_RE.find(&html).map_or(0, |m| m.end());
            html.insert_str(at, "\n<html>");
            html.push_str("\n</html>");
        }

        if !HEAD_OPEN_RE.is_match(&html) {
            let at = HTML_OPEN_RE.find(&html).map_or(0, |m| m.end());
            html.insert_str(at, "\n<head></head>");
        }

        if !BODY_OPEN_RE.is_match(&html) {
            let open_at = HEAD_CLOSE_RE
                .find(&html)
                .or_else(|| HEAD_OPEN_RE.find(&html))
                .map_or(0, |m| m.end());
            html.insert_str(open_at, "\n<body>");

            match HTML_CLOSE_RE.find_iter(&html).last().map(|m| m.start()) {
                Some(close_at) => html.insert_str(close_at, "</body>\n"),
                None => html.push_str("\n</body>"),
            }
        }

        html
    }
}

impl MarkupValidator for SafetyValidator {
    fn validate(&self, raw: &str) -> Result<String, RenderdError> {
        let script_count = Self::count_unsafe_elements(raw);
        if script_count > 0 {
            warn!("Rejecting template with {} script element(s)", script_count);
            return Err(RenderdError::UnsafeContent {
                script_count,
            });
        }

        let completed = Self::complete_structure(raw);
        if completed.len() != raw.len() {
            debug!("Completed document structure ({} -> {} bytes)", raw.len(), completed.len());
        }
        Ok(completed)
    }
}
