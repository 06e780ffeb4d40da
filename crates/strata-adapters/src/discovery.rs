//! Filesystem-based tier discovery.
//!
//! Walks one tier directory of the template store and yields every template
//! file in it, tagged with the tier it came from.
//!
//! # Directory layout expected
//!
//! ```text
//! store/
//! ├── base/                    ← shared base tier
//! │   ├── package.json.hbs
//! │   └── src/
//! ├── templates/
//! │   ├── saas/                ← named template tiers
//! │   └── ecommerce/
//! └── features/
//!     ├── ai/                  ← feature overlays
//!     └── auth/
//! ```
//!
//! The discoverer receives one tier root at a time; it knows nothing about
//! the layers above.

use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use strata_core::{
    application::{ApplicationError, ports::FileDiscoverer},
    domain::{TemplateFileInfo, TierSource},
    error::StrataResult,
};

/// Directory names never descended into. These are build artifacts and VCS
/// noise, not template content.
const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "coverage", "dist", "build", "target"];

/// File patterns excluded from discovery.
const EXCLUDED_SUFFIXES: &[&str] = &[".log"];

/// Production discoverer backed by `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirDiscoverer;

impl WalkdirDiscoverer {
    pub fn new() -> Self {
        Self
    }
}

impl FileDiscoverer for WalkdirDiscoverer {
    /// Walk `tier_root` recursively.
    ///
    /// A missing root is an empty contribution for the base tier; for the
    /// template and feature tiers the resolver pre-checks existence, so a
    /// vanished directory here is a real error.
    #[instrument(skip(self), fields(root = %tier_root.display(), tier = %source))]
    fn discover(&self, tier_root: &Path, source: TierSource) -> StrataResult<Vec<TemplateFileInfo>> {
        if !tier_root.exists() {
            if source == TierSource::Base {
                debug!("base tier absent, contributing nothing");
                return Ok(Vec::new());
            }
            return Err(ApplicationError::DiscoveryFailed {
                path: tier_root.to_path_buf(),
                reason: "directory not found".into(),
            }
            .into());
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(tier_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e));

        for entry in walker {
            let entry = entry.map_err(|e| ApplicationError::DiscoveryFailed {
                path: tier_root.to_path_buf(),
                reason: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if EXCLUDED_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
                continue;
            }

            let relative = match entry.path().strip_prefix(tier_root) {
                Ok(rel) => normalize_path(rel),
                Err(_) => {
                    // walkdir only yields descendants of the root; reaching
                    // here means a symlink escaped the tree.
                    warn!(path = %entry.path().display(), "entry outside tier root, skipping");
                    continue;
                }
            };

            files.push(TemplateFileInfo::new(
                entry.path().to_path_buf(),
                relative,
                source,
            ));
        }

        debug!(count = files.len(), "tier discovery complete");
        Ok(files)
    }
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Forward-slash normalize a relative path so conflict keys compare equal
/// across platforms.
fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
