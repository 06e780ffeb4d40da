//! Dependency Validator - cross-tier `package.json` merging.
//!
//! Manifests carry template syntax (`{{#if docker}}...{{/if}}`, `{{var}}`
//! placeholders), so they cannot be parsed as JSON directly. The validator
//! preprocesses each overlay manifest into parseable JSON, compares the
//! dependency tables against the base manifest, classifies version
//! disagreements, and produces the merged tables.
//!
//! Preprocessing is lossy on purpose: block wrappers are stripped while the
//! content they guard is kept, so the validator sees the superset of
//! dependencies a manifest can declare. A manifest that still fails to parse
//! becomes a warning and is skipped, never a hard failure.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::{
    ConflictResolution, ConflictSeverity, DependencyConflict, DependencySection,
    DependencyValidationOptions, TierSource, ValidationResult,
};

/// One manifest's content plus where it came from.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    pub relative_path: String,
    pub tier: TierSource,
    /// Tier label for conflict reports: "base", "template", or the feature
    /// directory name.
    pub label: String,
    pub content: String,
}

static BLOCK_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[#/](?:if|unless)\b[^}]*\}\}").unwrap());
static ELSE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{\s*else\s*\}\}").unwrap());
static COMMENT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{!(?:--)?[\s\S]*?(?:--)?\}\}").unwrap());
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^}]*\}\}").unwrap());

/// Stand-in substituted for `{{var}}` placeholders so the JSON stays valid.
/// The value never survives into output; merging only reads the dependency
/// tables, whose versions are literal in practice.
const PLACEHOLDER_STAND_IN: &str = "0.0.0-template";

/// Strip template syntax from a manifest until it parses as JSON.
///
/// Order matters: comments first (they may contain braces), then block
/// open/close tags (keeping the guarded content), then remaining inline
/// placeholders.
pub fn preprocess_manifest(content: &str) -> String {
    let content = COMMENT_TAG.replace_all(content, "");
    let content = BLOCK_TAGS.replace_all(&content, "");
    let content = ELSE_TAG.replace_all(&content, "");
    PLACEHOLDER
        .replace_all(&content, PLACEHOLDER_STAND_IN)
        .into_owned()
}

/// Validates and merges dependency tables across tiers.
#[derive(Debug, Default)]
pub struct DependencyValidator;

impl DependencyValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate every manifest against the base and produce merged tables.
    ///
    /// `manifests` must be in ascending priority order (base first); the
    /// resolver provides them that way. With no base manifest the first
    /// overlay seeds the tables and later overlays are compared against the
    /// accumulated state.
    #[instrument(skip_all, fields(manifests = manifests.len()))]
    pub fn validate_and_merge(
        &self,
        manifests: &[ManifestSource],
        options: &DependencyValidationOptions,
    ) -> ValidationResult {
        if options.skip_validation || manifests.is_empty() {
            return ValidationResult::passed();
        }

        let mut result = ValidationResult::passed();

        let mut parsed: Vec<(&ManifestSource, Value)> = Vec::new();
        for manifest in manifests {
            match serde_json::from_str::<Value>(&preprocess_manifest(&manifest.content)) {
                Ok(value) => parsed.push((manifest, value)),
                Err(e) => {
                    warn!(path = %manifest.relative_path, error = %e, "unparseable manifest, skipping");
                    result.warnings.push(format!(
                        "manifest '{}' could not be parsed after preprocessing ({}); skipped",
                        manifest.relative_path, e
                    ));
                }
            }
        }

        for section in [
            DependencySection::Dependencies,
            DependencySection::DevDependencies,
        ] {
            let merged = self.merge_section(section, &parsed, options, &mut result);
            match section {
                DependencySection::Dependencies => result.dependencies = merged,
                DependencySection::DevDependencies => result.dev_dependencies = merged,
            }
        }

        result.valid = options.warn_only || !result.has_errors();
        debug!(
            valid = result.valid,
            conflicts = result.conflicts.len(),
            "dependency validation complete"
        );
        result
    }

    fn merge_section(
        &self,
        section: DependencySection,
        parsed: &[(&ManifestSource, Value)],
        options: &DependencyValidationOptions,
        result: &mut ValidationResult,
    ) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        let mut seeded = false;

        for (manifest, value) in parsed {
            let table = extract_table(value, section.key());

            if !seeded {
                merged = table;
                seeded = true;
                continue;
            }

            for (package, version) in table {
                match merged.get(&package) {
                    None => {
                        merged.insert(package, version);
                    }
                    Some(existing) if *existing == version => {
                        result.warnings.push(format!(
                            "'{package}' ({section}) declared again by {} with the same version {version}",
                            manifest.label
                        ));
                    }
                    Some(existing) => {
                        let permitted = options.override_permitted(&package);
                        let conflict = DependencyConflict {
                            package: package.clone(),
                            section,
                            base_version: existing.clone(),
                            overlay_version: version.clone(),
                            overlay_source: manifest.label.clone(),
                            severity: if permitted {
                                ConflictSeverity::Warning
                            } else {
                                ConflictSeverity::Error
                            },
                            resolution: if permitted {
                                ConflictResolution::UseOverlay
                            } else {
                                ConflictResolution::UseBase
                            },
                        };
                        if conflict.resolution == ConflictResolution::UseOverlay {
                            merged.insert(package, version);
                        }
                        result.conflicts.push(conflict);
                    }
                }
            }
        }

        merged
    }
}

/// Pull one dependency table out of a parsed manifest. Non-string versions
/// are ignored.
fn extract_table(manifest: &Value, key: &str) -> BTreeMap<String, String> {
    manifest
        .get(key)
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
