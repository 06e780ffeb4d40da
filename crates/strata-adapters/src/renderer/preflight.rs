//! Preflight scanning of template source.
//!
//! Catches the common authoring mistakes before the engine ever compiles the
//! file: unknown helper names (with a "did you mean" suggestion), the removed
//! `switch`/`case` helpers, and JSX attribute object literals that collide
//! with template delimiters.
//!
//! The scan is line-oriented and regex-based. It does not attempt to fully
//! parse Handlebars; a token that looks like a helper invocation is enough to
//! check it against the registry.

use std::sync::LazyLock;

use regex::Regex;

use strata_core::domain::{DiagnosticKind, DiagnosticSeverity, TemplateDiagnostic};

use super::helpers::{DEPRECATED_HELPERS, HELPER_NAMES};

/// Handlebars' own built-ins, valid without registration.
const BUILTIN_HELPERS: &[&str] = &["if", "unless", "each", "with", "lookup", "log", "else", "this"];

/// Minimum normalized similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

// Block helper openers: {{#name ...}}
static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[#^]\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());
// Inline invocations with at least one argument: {{name arg ...}}.
// A bare {{name}} is a variable reference, not a helper call.
static INLINE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s+[^}|)]").unwrap());
// Subexpression heads: (name ...
static SUBEXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([A-Za-z_][A-Za-z0-9_]*)\s").unwrap());
// JSX-style attribute object literal: ={{ followed by something that is not
// a helper invocation (block marker, comment, or escape).
static MARKUP_COLLISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\{\{[\s{]").unwrap());

/// Scan one template file and return every finding.
pub fn scan(relative_path: &str, content: &str) -> Vec<TemplateDiagnostic> {
    let mut diagnostics = Vec::new();
    let markup_sensitive = is_markup_target(relative_path);

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;

        for name in helper_tokens(line) {
            if BUILTIN_HELPERS.contains(&name) || HELPER_NAMES.contains(&name) {
                continue;
            }
            if DEPRECATED_HELPERS.contains(&name) {
                diagnostics.push(
                    TemplateDiagnostic::new(
                        DiagnosticKind::Deprecated,
                        relative_path,
                        format!("the '{name}' helper was removed"),
                    )
                    .at_line(line_no)
                    .with_suggestion(
                        "use per-value conditionals such as if_database or if_feature",
                    ),
                );
                continue;
            }

            let mut diagnostic = TemplateDiagnostic::new(
                DiagnosticKind::MissingHelper,
                relative_path,
                format!("unknown helper '{name}'"),
            )
            .at_line(line_no)
            .with_severity(DiagnosticSeverity::Warning);
            if let Some(candidate) = closest_helper(name) {
                diagnostic = diagnostic.with_suggestion(format!("did you mean '{candidate}'?"));
            }
            diagnostics.push(diagnostic);
        }

        if markup_sensitive && MARKUP_COLLISION.is_match(line) {
            diagnostics.push(
                TemplateDiagnostic::new(
                    DiagnosticKind::MarkupConflict,
                    relative_path,
                    "JSX attribute object literal collides with template delimiters",
                )
                .at_line(line_no)
                .with_suggestion("the renderer escapes '={{' automatically; verify the output"),
            );
        }
    }

    diagnostics
}

/// True for files whose rendered output is JSX/TSX markup.
pub fn is_markup_target(relative_path: &str) -> bool {
    let output = relative_path.strip_suffix(".hbs").unwrap_or(relative_path);
    output.ends_with(".tsx") || output.ends_with(".jsx")
}

/// Candidate helper names on one line: block openers, inline calls with
/// arguments, and subexpression heads. Deduplicated in order.
fn helper_tokens(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for caps in BLOCK_OPEN
        .captures_iter(line)
        .chain(INLINE_CALL.captures_iter(line))
        .chain(SUBEXPR.captures_iter(line))
    {
        if let Some(m) = caps.get(1) {
            let name = m.as_str();
            if !tokens.contains(&name) {
                tokens.push(name);
            }
        }
    }
    tokens
}

/// Best fuzzy match among the registered helpers, top candidate only.
pub(crate) fn closest_helper(name: &str) -> Option<&'static str> {
    HELPER_NAMES
        .iter()
        .map(|candidate| (candidate, strsim::normalized_levenshtein(name, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| *candidate)
}
