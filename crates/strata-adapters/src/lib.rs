//! Infrastructure adapters for Strata.
//!
//! This crate implements the ports defined in `strata-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod discovery;
pub mod filesystem;
pub mod renderer;

// Re-export commonly used adapters
pub use discovery::WalkdirDiscoverer;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use renderer::HandlebarsRenderer;
