//! Template diagnostics produced by preflight scanning and render-failure
//! classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of template problem was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A helper name the engine does not register.
    MissingHelper,
    /// Malformed Handlebars syntax (unclosed block, bad expression).
    SyntaxError,
    /// JSX-style `={{ ... }}` attribute colliding with template delimiters.
    MarkupConflict,
    /// Deprecated construct that still parses but must be migrated.
    Deprecated,
    /// Anything the classifier could not pin down.
    Unknown,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingHelper => "missing_helper",
            Self::SyntaxError => "syntax_error",
            Self::MarkupConflict => "markup_conflict",
            Self::Deprecated => "deprecated",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Render can proceed; the finding is advisory.
    Warning,
    /// The file cannot be rendered as-is.
    Error,
}

/// One finding against one template file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDiagnostic {
    pub kind: DiagnosticKind,
    /// Relative path of the offending file.
    pub file: String,
    /// 1-based line, when the source location could be extracted.
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
    /// Actionable fix, e.g. a "did you mean" helper name.
    pub suggestion: Option<String>,
    pub severity: DiagnosticSeverity,
}

impl TemplateDiagnostic {
    pub fn new(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            line: None,
            column: None,
            message: message.into(),
            suggestion: None,
            severity: match kind {
                DiagnosticKind::MissingHelper | DiagnosticKind::SyntaxError => {
                    DiagnosticSeverity::Error
                }
                _ => DiagnosticSeverity::Warning,
            },
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for TemplateDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}
