//! Handlebars-backed implementation of the `ContentRenderer` port.
//!
//! Compiled templates are cached in the registry keyed by a hash of the
//! preprocessed source, so re-rendering the same file content (common when a
//! base file survives across runs or shows up in several tiers) skips the
//! parse. Hit/miss counters feed the generation metrics.
//!
//! ## Markup escaping
//!
//! JSX/TSX templates legitimately contain `style={{ color }}` attribute
//! object literals. For files whose output path ends in `.tsx`/`.jsx` the
//! renderer escapes `={{` sequences (when not followed by a template
//! expression) before compiling, so the braces survive into the output
//! verbatim.
//!
//! ## Failure handling
//!
//! Render failures are classified (`missing_helper`, `syntax_error`,
//! `markup_conflict`, `unknown`) with a line number when one can be pulled
//! out of the engine error. In the default permissive mode a file that fails
//! after markup escaping is retried once without the preprocessing; strict
//! mode aborts on the first failure.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use handlebars::Handlebars;
use regex::Regex;
use tracing::{debug, instrument, warn};

use strata_core::{
    application::{
        ApplicationError,
        ports::{ContentRenderer, RenderCacheStats, RenderOutcome},
    },
    domain::{DiagnosticKind, DiagnosticSeverity, ProjectContext, TemplateDiagnostic},
    error::{StrataError, StrataResult},
};

use super::helpers::register_helpers;
use super::preflight;

static LINE_IN_ERROR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"line (\d+)").unwrap());
// handlebars 5 says `Helper not found <name>`; older releases said
// `Helper not defined: "<name>"`. Accept both shapes.
static HELPER_IN_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Helper not (?:found|defined:?) "?([A-Za-z_][A-Za-z0-9_]*)"#).unwrap()
});
// `={{` that opens a JS object literal rather than a template expression.
static MARKUP_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"=\{\{([\s{])").unwrap());

/// Production renderer built on Handlebars with the full helper library.
pub struct HandlebarsRenderer {
    registry: RwLock<Handlebars<'static>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    strict: bool,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        // Output is source code, not HTML.
        registry.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut registry);
        Self {
            registry: RwLock::new(registry),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            strict: false,
        }
    }

    /// Abort on the first render failure instead of retrying without markup
    /// preprocessing.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Compile (or fetch from cache) and execute one template source.
    fn execute(&self, source: &str, context: &ProjectContext) -> Result<String, String> {
        let key = cache_key(source);

        let cached = {
            let registry = self.registry.read().map_err(|_| "registry lock poisoned")?;
            registry.has_template(&key)
        };

        if cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            let mut registry = self.registry.write().map_err(|_| "registry lock poisoned")?;
            // A racing thread may have registered it between the read and
            // write lock; re-registering the same content is harmless.
            registry
                .register_template_string(&key, source)
                .map_err(|e| e.to_string())?;
        }

        let registry = self.registry.read().map_err(|_| "registry lock poisoned")?;
        registry.render(&key, context).map_err(|e| e.to_string())
    }

    fn classify(&self, relative_path: &str, message: &str, escaped: bool) -> TemplateDiagnostic {
        let line = LINE_IN_ERROR
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());

        let mut diagnostic = if let Some(helper) = HELPER_IN_ERROR
            .captures(message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        {
            let mut d = TemplateDiagnostic::new(
                DiagnosticKind::MissingHelper,
                relative_path,
                format!("unknown helper '{helper}'"),
            );
            if let Some(candidate) = super::closest_helper(&helper) {
                d = d.with_suggestion(format!("did you mean '{candidate}'?"));
            }
            d
        } else if message.contains("invalid handlebars syntax")
            || message.contains("Template error")
            || message.contains("not closed")
            || message.contains("closing helper")
        {
            TemplateDiagnostic::new(
                DiagnosticKind::SyntaxError,
                relative_path,
                message.to_string(),
            )
            .with_suggestion("check for unclosed {{#blocks}} and stray braces")
        } else if escaped {
            TemplateDiagnostic::new(
                DiagnosticKind::MarkupConflict,
                relative_path,
                message.to_string(),
            )
            .with_suggestion("JSX object literals conflict with template delimiters")
        } else {
            TemplateDiagnostic::new(DiagnosticKind::Unknown, relative_path, message.to_string())
        };

        if let Some(line) = line {
            diagnostic = diagnostic.at_line(line);
        }
        diagnostic.with_severity(DiagnosticSeverity::Error)
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRenderer for HandlebarsRenderer {
    fn preflight(&self, relative_path: &str, content: &str) -> Vec<TemplateDiagnostic> {
        preflight::scan(relative_path, content)
    }

    #[instrument(skip_all, fields(file = relative_path))]
    fn render(
        &self,
        relative_path: &str,
        content: &str,
        context: &ProjectContext,
    ) -> StrataResult<RenderOutcome> {
        let mut diagnostics = Vec::new();

        let needs_escaping = preflight::is_markup_target(relative_path);
        let prepared = if needs_escaping {
            let (escaped, count) = escape_markup(content);
            if count > 0 {
                debug!(count, "escaped JSX object literals");
                diagnostics.push(
                    TemplateDiagnostic::new(
                        DiagnosticKind::MarkupConflict,
                        relative_path,
                        format!("{count} JSX object literal(s) escaped before rendering"),
                    )
                    .with_severity(DiagnosticSeverity::Warning),
                );
            }
            escaped
        } else {
            content.to_string()
        };

        match self.execute(&prepared, context) {
            Ok(rendered) => Ok(RenderOutcome {
                content: rendered,
                diagnostics,
            }),
            Err(message) => {
                let primary = self.classify(relative_path, &message, needs_escaping);

                // Permissive mode gives templates that the escaping pass
                // mangled a second chance with the raw source.
                if !self.strict && needs_escaping && prepared != content {
                    warn!(file = relative_path, "escaped render failed, retrying raw source");
                    if let Ok(rendered) = self.execute(content, context) {
                        diagnostics.push(primary.with_severity(DiagnosticSeverity::Warning));
                        return Ok(RenderOutcome {
                            content: rendered,
                            diagnostics,
                        });
                    }
                }

                Err(render_failure(relative_path, primary))
            }
        }
    }

    fn cache_stats(&self) -> RenderCacheStats {
        RenderCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn render_failure(relative_path: &str, diagnostic: TemplateDiagnostic) -> StrataError {
    ApplicationError::RenderingFailed {
        file: relative_path.to_string(),
        reason: diagnostic.to_string(),
    }
    .into()
}

/// Escape `={{ ...` JSX attribute literals so Handlebars passes the braces
/// through. Returns the escaped source and the number of sites touched.
fn escape_markup(content: &str) -> (String, usize) {
    let count = MARKUP_OPEN.find_iter(content).count();
    // `\{{` is the engine's raw-brace escape; it renders as `{{`.
    let escaped = MARKUP_OPEN.replace_all(content, r"=\{{$1").into_owned();
    (escaped, count)
}

fn cache_key(source: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    format!("tpl-{:016x}", hasher.finish())
}
