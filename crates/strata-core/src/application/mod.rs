//! Application layer for Strata.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ProjectGenerator, InheritanceResolver, DependencyValidator)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    DependencyValidator, GenerateOptions, GenerationMetrics, GenerationReport,
    InheritanceResolver, ProjectGenerator, Resolution,
};

// Re-export port traits (for adapter implementation)
pub use ports::{ContentRenderer, FileDiscoverer, Filesystem, RenderCacheStats, RenderOutcome};

pub use error::ApplicationError;
