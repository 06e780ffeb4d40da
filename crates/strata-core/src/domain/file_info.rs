//! Discovered template files and their originating tiers.
//!
//! Every file that the discoverer finds is tagged with the tier it came from.
//! The tier carries an integer priority used as the tie-break during conflict
//! resolution: `base` (1) < `template` (2) < `feature` (3). Higher wins under
//! the default policy.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which of the three layered sources a file was discovered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierSource {
    /// The shared base tier every template may inherit from.
    Base,
    /// The named template tier the user asked for.
    Template,
    /// A feature overlay layered on top of base + template.
    Feature,
}

impl TierSource {
    /// Integer rank used as the conflict tie-break. Higher wins by default.
    pub fn priority(self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Template => 2,
            Self::Feature => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Template => "template",
            Self::Feature => "feature",
        }
    }
}

impl fmt::Display for TierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File suffix marking a file as renderable through the template engine.
///
/// Files without this suffix are copied verbatim (static/binary assets).
pub const TEMPLATE_SUFFIX: &str = ".hbs";

/// One physical file as discovered in one tier.
///
/// Created fresh per resolution call, never mutated, discarded after the
/// batch completes. The `relative_path` is the conflict-resolution key and is
/// always forward-slash normalized regardless of host OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFileInfo {
    /// Absolute source location inside the template store.
    pub path: PathBuf,

    /// Path relative to the tier root, forward-slash normalized.
    pub relative_path: String,

    /// Which tier this entry was discovered in.
    pub source: TierSource,

    /// True when the file carries the [`TEMPLATE_SUFFIX`] and must be
    /// rendered; false means copy verbatim.
    pub is_renderable: bool,
}

impl TemplateFileInfo {
    /// Build an entry, deriving `is_renderable` from the path suffix.
    pub fn new(path: impl Into<PathBuf>, relative_path: impl Into<String>, source: TierSource) -> Self {
        let relative_path = relative_path.into();
        let is_renderable = relative_path.ends_with(TEMPLATE_SUFFIX);
        Self {
            path: path.into(),
            relative_path,
            source,
            is_renderable,
        }
    }

    /// Tie-break rank inherited from the tier.
    pub fn priority(&self) -> u8 {
        self.source.priority()
    }

    /// The path this file will occupy in the generated project: the relative
    /// path with the template suffix stripped.
    pub fn output_path(&self) -> &str {
        self.relative_path
            .strip_suffix(TEMPLATE_SUFFIX)
            .unwrap_or(&self.relative_path)
    }
}
