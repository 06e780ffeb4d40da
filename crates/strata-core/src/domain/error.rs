// ============================================================================
// domain/error.rs - DOMAIN ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (for retry logic)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid project context: {0}")]
    InvalidContext(String),

    #[error("Unknown feature '{feature}' (known features: {known})")]
    UnknownFeature { feature: String, known: String },

    // ========================================================================
    // Not Found Errors (404-level equivalent)
    // ========================================================================
    #[error("Template '{name}' not found (searched: {searched})")]
    TemplateNotFound { name: String, searched: String },

    // ========================================================================
    // Conflict Errors (409-level equivalent)
    // ========================================================================
    #[error("Conflicting sources for '{path}' under the error policy: {sources}")]
    UnresolvedConflict { path: String, sources: String },

    #[error("Dependency conflicts block generation:\n{details}")]
    DependencyConflicts { count: usize, details: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidContext(msg) => vec![
                "Check the project configuration".into(),
                format!("Details: {}", msg),
            ],
            Self::UnknownFeature { known, .. } => vec![
                format!("Known features: {}", known),
                "Remove the unknown feature or check its spelling".into(),
            ],
            Self::TemplateNotFound { searched, .. } => vec![
                "Try: strata list".into(),
                format!("Searched paths: {}", searched),
            ],
            Self::UnresolvedConflict { .. } => vec![
                "Switch the conflict policy to 'template-wins' or 'base-wins'".into(),
                "Or remove the duplicate file from one of the tiers".into(),
            ],
            Self::DependencyConflicts { .. } => vec![
                "Re-run with --allow-overrides to accept overlay versions".into(),
                "Or align the versions in the conflicting package.json files".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidContext(_) | Self::UnknownFeature { .. } => ErrorCategory::Validation,
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::UnresolvedConflict { .. } | Self::DependencyConflicts { .. } => {
                ErrorCategory::Conflict
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Internal,
}
