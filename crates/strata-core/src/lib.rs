//! Strata Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Strata
//! project scaffolding engine, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (ProjectGenerator, InheritanceResolver, │
//! │          DependencyValidator)           │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Driven: Discover, Render, Filesystem)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     strata-adapters (Infrastructure)    │
//! │ (WalkdirDiscoverer, HandlebarsRenderer, │
//! │       LocalFilesystem, MemoryFs)        │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │  (ProjectContext, TemplateFileInfo,     │
//! │   InheritanceRules, DependencyConflict) │
//! │        No External Dependencies         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_core::application::{GenerateOptions, InheritanceResolver, ProjectGenerator};
//! use strata_core::domain::{InheritanceRules, ProjectContext};
//!
//! # fn demo(
//! #     discoverer: Arc<dyn strata_core::application::FileDiscoverer>,
//! #     renderer: Arc<dyn strata_core::application::ContentRenderer>,
//! #     filesystem: Arc<dyn strata_core::application::Filesystem>,
//! # ) -> strata_core::error::StrataResult<()> {
//! // 1. Build the context
//! let context = ProjectContext::new("my-shop", "ecommerce")
//!     .with_feature("auth")
//!     .with_feature("payments");
//!
//! // 2. Wire the generator (with injected adapters)
//! let resolver = InheritanceResolver::new(
//!     discoverer,
//!     filesystem.clone(),
//!     "/srv/templates",
//!     InheritanceRules::default(),
//! );
//! let generator = ProjectGenerator::new(resolver, renderer, filesystem);
//!
//! // 3. Generate
//! let report = generator.generate(&context, "./my-shop", &GenerateOptions::default())?;
//! println!("{} files generated", report.generated.len());
//! # Ok(())
//! # }
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        GenerateOptions, GenerationReport, InheritanceResolver, ProjectGenerator,
        ports::{ContentRenderer, FileDiscoverer, Filesystem},
    };
    pub use crate::domain::{
        AiSettings, ConflictPolicy, Database, DependencyValidationOptions, Environment,
        InheritanceRules, ProjectContext, TemplateFileInfo, TierSource, ValidationResult,
    };
    pub use crate::error::{StrataError, StrataResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
