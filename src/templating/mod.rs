//! Tera-based template compilation and the renderer cache.
//!
//! Templates are HTML documents with Tera interpolation, e.g.
//!
//! ```text
//! <h1>{{ title }}</h1>
//! <p>{{ user.name }} ({{ user.role }})</p>
//! ```
//!
//! # Supported Features
//!
//! - Variable substitution with dotted paths: `{{ user.name }}`
//! - Conditional logic: `{% if user.admin %}...{% endif %}`
//! - Loops: `{% for item in items %}...{% endfor %}`
//! - Standard Tera filters
//!
//! Every value is HTML-escaped on output, and a bare interpolation of a path
//! that is missing from the variables renders as an empty string. Use
//! `{% raw %}...{% endraw %}` to emit template delimiters literally.
//!
//! # Template Syntax
//!
//! Keys end in `.hbs` for historical reasons, but the syntax is Tera's, not
//! Handlebars'. Plain `{{ path }}` interpolation reads the same in both.
//! Handlebars-only forms such as `{{{ unescaped }}}`, `{{#if x}}...{{/if}}`,
//! `{{#each}}` and partials are not understood and fail with
//! [`RenderdError::CompileError`]. Their Tera equivalents are
//! `{{ value | safe }}`, `{% if x %}...{% endif %}` and
//! `{% for item in items %}...{% endfor %}`.
//!
//! - [`CompiledTemplate`] - one compiled template, rendered many times
//! - [`RendererCache`] - compiled templates keyed by template key with a time-to-live
//!
//! [`RenderdError::CompileError`]: crate::core::RenderdError::CompileError

mod cache;
mod engine;

pub use cache::RendererCache;
pub use engine::CompiledTemplate;
