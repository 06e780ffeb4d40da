//! Manifest dependency conflicts and validation results.
//!
//! Shapes emitted by the dependency merger and surfaced verbatim in the
//! generation report, so everything here derives `Serialize`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which dependency table of a manifest a conflict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencySection {
    Dependencies,
    DevDependencies,
}

impl DependencySection {
    /// JSON key inside the manifest.
    pub fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
        }
    }
}

impl fmt::Display for DependencySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Severity of a single version disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Warning,
    Error,
}

/// How a conflict will be settled when the merge applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    /// Keep the overlay's version (override was permitted).
    UseOverlay,
    /// Keep the base version (override was not permitted).
    UseBase,
}

/// One package whose version differs between the base manifest and an
/// overlay manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConflict {
    pub package: String,
    pub section: DependencySection,
    pub base_version: String,
    pub overlay_version: String,
    /// Tier label of the overlay manifest ("template" or the feature name).
    pub overlay_source: String,
    pub severity: ConflictSeverity,
    pub resolution: ConflictResolution,
}

impl DependencyConflict {
    /// Human-readable one-liner used in reports and error output.
    pub fn describe(&self) -> String {
        format!(
            "{} ({}): base wants {}, {} wants {} [{}]",
            self.package,
            self.section,
            self.base_version,
            self.overlay_source,
            self.overlay_version,
            match self.resolution {
                ConflictResolution::UseOverlay => "using overlay",
                ConflictResolution::UseBase => "keeping base",
            }
        )
    }
}

/// Knobs for the dependency validation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyValidationOptions {
    /// Downgrade every version conflict to a warning resolved overlay-wins.
    pub allow_overrides: bool,
    /// Packages individually permitted to override the base version.
    pub allowed_overrides: Vec<String>,
    /// Report error conflicts but do not fail generation.
    pub warn_only: bool,
    /// Skip the pass entirely; manifests resolve like any other file.
    pub skip_validation: bool,
}

impl DependencyValidationOptions {
    pub fn override_permitted(&self, package: &str) -> bool {
        self.allow_overrides || self.allowed_overrides.iter().any(|p| p == package)
    }
}

/// Outcome of validating and merging every discovered manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False only when at least one error-severity conflict exists and
    /// `warn_only` is off.
    pub valid: bool,
    pub conflicts: Vec<DependencyConflict>,
    /// Non-fatal notices: unparseable overlay manifests, duplicate identical
    /// versions, merge-policy fallbacks.
    pub warnings: Vec<String>,
    /// Merged `dependencies` table, base seeded, overlays applied per
    /// conflict resolution. Sorted for deterministic output.
    pub dependencies: BTreeMap<String, String>,
    /// Merged `devDependencies` table.
    pub dev_dependencies: BTreeMap<String, String>,
}

impl ValidationResult {
    /// A result for runs where validation was skipped or no manifests exist.
    pub fn passed() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub fn error_conflicts(&self) -> impl Iterator<Item = &DependencyConflict> {
        self.conflicts
            .iter()
            .filter(|c| c.severity == ConflictSeverity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.error_conflicts().next().is_some()
    }
}
