//! Tera binding: compile a validated document once, render it many times.

use regex::Regex;
use std::sync::LazyLock;
use tera::{Context as TeraContext, Tera};

use crate::core::RenderdError;

/// Bare path interpolation such as `{{ user.name }}` or `{{- items.0 -}}`.
static INTERPOLATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(-?)\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*(-?)\}\}")
        .expect("interpolation pattern is valid")
});

/// `{% raw %}...{% endraw %}` block, whose body Tera emits verbatim.
static RAW_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}")
        .expect("raw block pattern is valid")
});

/// A compiled, reusable renderer for one template.
///
/// Each compiled template owns an isolated [`Tera`] instance containing only
/// that template, so renderers never see each other's definitions and can be
/// dropped independently when evicted from the cache.
///
/// Compilation applies two settings on top of Tera's defaults:
///
/// - **Autoescaping is on** for every template regardless of its name, since
///   the output is always HTML.
/// - **Lenient interpolation**: a bare path interpolation `{{ a.b }}` renders
///   as empty when the path is missing from the variables, instead of failing
///   the whole render. Expressions with filters, tests or operators keep
///   Tera's strict behavior. Text inside `{% raw %}` blocks is left alone.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    tera: Tera,
}

impl CompiledTemplate {
    /// Compile `source` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::CompileError`] if Tera cannot parse the source.
    pub fn compile(name: &str, source: &str) -> Result<Self, RenderdError> {
        let prepared = lenient_interpolations(source);

        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        tera.add_raw_template(name, &prepared).map_err(|e| RenderdError::CompileError {
            key: name.to_string(),
            message: format_tera_error(&e),
        })?;

        tracing::debug!("Compiled template '{}'", name);
        Ok(Self {
            name: name.to_string(),
            tera,
        })
    }

    /// Name the template was compiled under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with a JSON object of variables.
    ///
    /// # Errors
    ///
    /// Returns [`RenderdError::RenderError`] if `variables` is not a JSON
    /// object or Tera fails during substitution.
    pub fn render(&self, variables: &serde_json::Value) -> Result<String, RenderdError> {
        let context = TeraContext::from_serialize(variables).map_err(|e| self.render_error(&e))?;
        self.tera.render(&self.name, &context).map_err(|e| self.render_error(&e))
    }

    fn render_error(&self, error: &tera::Error) -> RenderdError {
        RenderdError::RenderError {
            key: self.name.clone(),
            message: format_tera_error(error),
        }
    }
}

/// Rewrite bare path interpolations to fall back to an empty string.
///
/// Raw blocks are copied through untouched.
fn lenient_interpolations(source: &str) -> String {
    const LENIENT: &str = r#"{{$1 $2 | default(value="") $3}}"#;

    let mut prepared = String::with_capacity(source.len());
    let mut last = 0;
    for raw in RAW_BLOCK_RE.find_iter(source) {
        prepared.push_str(&INTERPOLATION_RE.replace_all(&source[last..raw.start()], LENIENT));
        prepared.push_str(raw.as_str());
        last = raw.end();
    }
    prepared.push_str(&INTERPOLATION_RE.replace_all(&source[last..], LENIENT));
    prepared
}

/// Flatten a Tera error and its sources into one readable message.
fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        let message = err.to_string();
        if !message.trim().is_empty() {
            messages.push(message);
        }
        current = err.source();
    }
    messages.join(": ")
}
