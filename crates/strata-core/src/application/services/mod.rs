//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "generate a project" or "resolve the tier
//! chain".

pub mod generator;
pub mod manifest;
pub mod resolver;

pub use generator::{
    DEFAULT_BATCH_SIZE, GenerateOptions, GenerationMetrics, GenerationReport, ProjectGenerator,
};
pub use manifest::{DependencyValidator, ManifestSource, preprocess_manifest};
pub use resolver::{
    BASE_DIR, FEATURES_DIR, InheritanceResolver, Resolution, TEMPLATES_DIR, is_manifest_path,
};
