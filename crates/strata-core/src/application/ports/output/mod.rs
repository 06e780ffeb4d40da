//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `strata-adapters` crate provides implementations.

use std::path::Path;

use crate::domain::{ProjectContext, TemplateDiagnostic, TemplateFileInfo, TierSource};
use crate::error::StrataResult;

/// Port for walking one tier directory of the template store.
///
/// Implemented by:
/// - `strata_adapters::discovery::WalkdirDiscoverer` (production)
///
/// ## Contract
///
/// - Recursive; directories themselves are never yielded.
/// - Noise directories (`node_modules`, `.git`, `coverage`, `dist`, `build`,
///   `target`) and `*.log` files are excluded.
/// - `relative_path` is forward-slash normalized on every platform.
/// - A missing root is an empty result for [`TierSource::Base`] and an error
///   for the other tiers.
pub trait FileDiscoverer: Send + Sync {
    fn discover(&self, tier_root: &Path, source: TierSource) -> StrataResult<Vec<TemplateFileInfo>>;
}

/// Hit/miss counters from the renderer's compiled-template cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderCacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl RenderCacheStats {
    /// Hit ratio in `[0, 1]`; zero when nothing was rendered.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Result of rendering one template file.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub content: String,
    /// Non-fatal findings (markup collisions handled by fallback, deprecated
    /// constructs that still rendered).
    pub diagnostics: Vec<TemplateDiagnostic>,
}

/// Port for template compilation and execution.
///
/// Implemented by:
/// - `strata_adapters::renderer::HandlebarsRenderer` (production)
///
/// Implementations must be safe to call from multiple threads at once; the
/// generator renders files in batches.
pub trait ContentRenderer: Send + Sync {
    /// Scan template source for problems without rendering it.
    fn preflight(&self, relative_path: &str, content: &str) -> Vec<TemplateDiagnostic>;

    /// Render template source against the context.
    fn render(
        &self,
        relative_path: &str,
        content: &str,
        context: &ProjectContext,
    ) -> StrataResult<RenderOutcome>;

    /// Compiled-template cache counters for the metrics block.
    fn cache_stats(&self) -> RenderCacheStats;
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `strata_adapters::filesystem::LocalFilesystem` (production)
/// - `strata_adapters::filesystem::MemoryFilesystem` (testing)
///
/// ## Design Notes
///
/// - Reads cover the template store side, writes the output side.
/// - Byte-level read/write exists for static assets that are not UTF-8.
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StrataResult<()>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> StrataResult<String>;

    /// Read a file as raw bytes.
    fn read(&self, path: &Path) -> StrataResult<Vec<u8>>;

    /// Write text content to a file.
    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()>;

    /// Write raw bytes to a file.
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StrataResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> StrataResult<()>;
}
