// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Strata.
//!
//! This module contains pure business logic with ZERO external dependencies.
//! All I/O, templating, and rendering concerns are handled via ports (traits)
//! defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **No heavy crates**: std + thiserror + serde derives only
//! - **Immutable entities**: All domain objects are Clone + PartialEq
//! - **Rich domain model**: Behavior lives in entities, not services

// Public API - what the world sees
pub mod context;
pub mod dependency;
pub mod diagnostics;
pub mod error;
pub mod file_info;
pub mod policy;

// Re-exports for convenience
pub use context::{AiSettings, Database, Environment, ProjectContext, Toggles, KNOWN_FEATURES};
pub use dependency::{
    ConflictResolution, ConflictSeverity, DependencyConflict, DependencySection,
    DependencyValidationOptions, ValidationResult,
};
pub use diagnostics::{DiagnosticKind, DiagnosticSeverity, TemplateDiagnostic};
pub use error::{DomainError, ErrorCategory};
pub use file_info::{TemplateFileInfo, TierSource, TEMPLATE_SUFFIX};
pub use policy::{pattern_matches, ConflictPolicy, InheritanceRules};
