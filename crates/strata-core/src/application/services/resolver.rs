//! Inheritance Resolver - settles the three-tier file set.
//!
//! Collects files from base, the named template, and every enabled feature
//! overlay, then resolves same-path conflicts into one winner per
//! `relative_path`. Pure function of the discovered tiers: resolving the same
//! store twice with the same context yields the same file set.
//!
//! Store layout (one directory per tier):
//!
//! ```text
//! <store_root>/
//!   base/                   shared base tier
//!   templates/<name>/       named templates (saas, ecommerce, ai-chat, ...)
//!   features/<name>/        feature overlays (ai, auth, payments, ...)
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    application::ports::{FileDiscoverer, Filesystem},
    domain::{
        ConflictPolicy, DomainError, InheritanceRules, ProjectContext, TemplateFileInfo,
        TierSource, TEMPLATE_SUFFIX,
    },
    error::StrataResult,
};

/// Directory name of the shared base tier.
pub const BASE_DIR: &str = "base";
/// Directory holding the named templates.
pub const TEMPLATES_DIR: &str = "templates";
/// Directory holding the feature overlays.
pub const FEATURES_DIR: &str = "features";

/// Outcome of tier resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One winner per relative path, sorted by `relative_path`.
    pub files: Vec<TemplateFileInfo>,
    /// Output paths that came from base untouched.
    pub inherited: Vec<String>,
    /// Output paths where a higher tier displaced a lower one.
    pub overridden: Vec<String>,
    /// Non-fatal notices (merge-policy fallbacks and the like).
    pub warnings: Vec<String>,
    /// Every manifest entry from every tier, in ascending priority order.
    /// Populated only when manifest merging is on; these paths are excluded
    /// from `files` conflict handling for the base tier.
    pub manifests: Vec<TemplateFileInfo>,
}

/// Resolves the base < template < feature inheritance chain.
pub struct InheritanceResolver {
    discoverer: Arc<dyn FileDiscoverer>,
    filesystem: Arc<dyn Filesystem>,
    store_root: PathBuf,
    rules: InheritanceRules,
    /// When true, `package.json` manifests from the base tier are pulled out
    /// of file-level resolution and handed to the dependency merger.
    manifest_merge: bool,
}

impl InheritanceResolver {
    pub fn new(
        discoverer: Arc<dyn FileDiscoverer>,
        filesystem: Arc<dyn Filesystem>,
        store_root: impl Into<PathBuf>,
        rules: InheritanceRules,
    ) -> Self {
        Self {
            discoverer,
            filesystem,
            store_root: store_root.into(),
            rules,
            manifest_merge: true,
        }
    }

    pub fn with_manifest_merge(mut self, on: bool) -> Self {
        self.manifest_merge = on;
        self
    }

    /// Resolve the full file set for a template + context.
    #[instrument(skip_all, fields(template = %template_name, features = context.features.len()))]
    pub fn resolve(
        &self,
        template_name: &str,
        context: &ProjectContext,
    ) -> StrataResult<Resolution> {
        let mut entries: Vec<TemplateFileInfo> = Vec::new();

        // Phase 1: base tier. Skipped when the caller asked for the base
        // itself; a missing base directory contributes nothing.
        if template_name != BASE_DIR {
            let base_root = self.store_root.join(BASE_DIR);
            entries.extend(self.discoverer.discover(&base_root, TierSource::Base)?);
        }

        // Phase 2: the named template. Missing is fatal.
        let template_root = self.store_root.join(TEMPLATES_DIR).join(template_name);
        if !self.filesystem.exists(&template_root) {
            return Err(DomainError::TemplateNotFound {
                name: template_name.to_string(),
                searched: template_root.display().to_string(),
            }
            .into());
        }
        entries.extend(
            self.discoverer
                .discover(&template_root, TierSource::Template)?,
        );

        // Phase 3: feature overlays in context order. A feature without an
        // overlay directory silently contributes nothing.
        for feature in &context.features {
            let feature_root = self.store_root.join(FEATURES_DIR).join(feature);
            if !self.filesystem.exists(&feature_root) {
                debug!(feature, "no overlay directory, skipping");
                continue;
            }
            entries.extend(self.discoverer.discover(&feature_root, TierSource::Feature)?);
        }

        self.resolve_entries(entries)
    }

    /// Phase 4: group by relative path and pick winners. Separated from the
    /// discovery phases so tests can feed synthetic tiers directly.
    pub fn resolve_entries(&self, entries: Vec<TemplateFileInfo>) -> StrataResult<Resolution> {
        let mut resolution = Resolution::default();

        // BTreeMap keeps the output ordering deterministic. Insertion order
        // within a group preserves discovery order, which is the tie-break
        // between two same-priority overlays (later feature wins).
        let mut groups: BTreeMap<String, Vec<TemplateFileInfo>> = BTreeMap::new();
        for entry in entries {
            if self.manifest_merge && is_manifest_path(&entry.relative_path) {
                resolution.manifests.push(entry.clone());
                if entry.source == TierSource::Base {
                    // The base manifest only feeds the dependency merger.
                    continue;
                }
            }
            groups.entry(entry.relative_path.clone()).or_default().push(entry);
        }

        resolution
            .manifests
            .sort_by_key(|m| (m.priority(), m.relative_path.clone()));

        for (path, group) in groups {
            let had_base = group.iter().any(|e| e.source == TierSource::Base);
            let winner = self.pick_winner(&path, group, &mut resolution.warnings)?;

            let Some(winner) = winner else { continue };

            match winner.source {
                TierSource::Base => resolution.inherited.push(winner.output_path().to_string()),
                _ if had_base => resolution.overridden.push(winner.output_path().to_string()),
                _ => {}
            }
            resolution.files.push(winner);
        }

        resolution
            .files
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(resolution)
    }

    /// Apply the rule chain to one same-path group. `None` means the path
    /// produces no output file at all (the never-inherit degenerate case).
    fn pick_winner(
        &self,
        path: &str,
        mut group: Vec<TemplateFileInfo>,
        warnings: &mut Vec<String>,
    ) -> StrataResult<Option<TemplateFileInfo>> {
        // Rule 1: never-inherit drops base unconditionally. A base-only group
        // collapses to nothing, deliberately.
        if self.rules.matches_never_inherit(path) {
            group.retain(|e| e.source != TierSource::Base);
            return Ok(highest_priority(group));
        }

        // Rule 2: always-inherit keeps base unless an overlay also ships the
        // file.
        if self.rules.matches_always_inherit(path) {
            let has_overlay = group.iter().any(|e| e.source != TierSource::Base);
            if has_overlay {
                group.retain(|e| e.source != TierSource::Base);
            }
            return Ok(highest_priority(group));
        }

        // Rule 3: excluded paths never take the base version.
        if self.rules.matches_excluded(path) {
            group.retain(|e| e.source != TierSource::Base);
            return Ok(highest_priority(group));
        }

        if group.len() <= 1 {
            return Ok(group.pop());
        }

        // Rule 4: the configured policy.
        match self.rules.policy {
            ConflictPolicy::TemplateWins => Ok(highest_priority(group)),
            ConflictPolicy::BaseWins => Ok(lowest_priority(group)),
            ConflictPolicy::Error => {
                let sources: Vec<String> = group
                    .iter()
                    .map(|e| format!("{} ({})", e.source, e.path.display()))
                    .collect();
                Err(DomainError::UnresolvedConflict {
                    path: path.to_string(),
                    sources: sources.join(", "),
                }
                .into())
            }
            ConflictPolicy::Merge => {
                warn!(path, "merge policy falls back to highest-priority tier");
                warnings.push(format!(
                    "merge policy for '{path}' fell back to the highest-priority tier; \
                     structural merging only applies to package manifests"
                ));
                Ok(highest_priority(group))
            }
        }
    }
}

/// Later entries win ties, so two same-priority feature overlays resolve to
/// the one discovered last.
fn highest_priority(group: Vec<TemplateFileInfo>) -> Option<TemplateFileInfo> {
    group
        .into_iter()
        .enumerate()
        .max_by_key(|(idx, e)| (e.priority(), *idx))
        .map(|(_, e)| e)
}

fn lowest_priority(group: Vec<TemplateFileInfo>) -> Option<TemplateFileInfo> {
    group
        .into_iter()
        .enumerate()
        .min_by_key(|(idx, e)| (e.priority(), *idx))
        .map(|(_, e)| e)
}

/// True for `package.json` and `package.json.hbs` at any depth.
pub fn is_manifest_path(relative_path: &str) -> bool {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let file_name = file_name.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(file_name);
    file_name == "package.json"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct NoopDiscoverer;
    impl FileDiscoverer for NoopDiscoverer {
        fn discover(
            &self,
            _tier_root: &Path,
            _source: TierSource,
        ) -> StrataResult<Vec<TemplateFileInfo>> {
            Ok(Vec::new())
        }
    }

    struct NoopFs;
    impl Filesystem for NoopFs {
        fn create_dir_all(&self, _: &Path) -> StrataResult<()> {
            Ok(())
        }
        fn read_to_string(&self, _: &Path) -> StrataResult<String> {
            Ok(String::new())
        }
        fn read(&self, _: &Path) -> StrataResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn write_file(&self, _: &Path, _: &str) -> StrataResult<()> {
            Ok(())
        }
        fn write_bytes(&self, _: &Path, _: &[u8]) -> StrataResult<()> {
            Ok(())
        }
        fn exists(&self, _: &Path) -> bool {
            false
        }
        fn remove_dir_all(&self, _: &Path) -> StrataResult<()> {
            Ok(())
        }
    }

    fn resolver(rules: InheritanceRules) -> InheritanceResolver {
        InheritanceResolver::new(Arc::new(NoopDiscoverer), Arc::new(NoopFs), "/store", rules)
    }

    fn entry(rel: &str, source: TierSource) -> TemplateFileInfo {
        TemplateFileInfo::new(format!("/store/{}/{rel}", source), rel, source)
    }

    #[test]
    fn highest_tier_wins_by_default() {
        let r = resolver(InheritanceRules::default());
        let resolution = r
            .resolve_entries(vec![
                entry("src/index.ts.hbs", TierSource::Base),
                entry("src/index.ts.hbs", TierSource::Template),
                entry("src/index.ts.hbs", TierSource::Feature),
            ])
            .unwrap();
        assert_eq!(resolution.files.len(), 1);
        assert_eq!(resolution.files[0].source, TierSource::Feature);
        assert_eq!(resolution.overridden, vec!["src/index.ts"]);
        assert!(resolution.inherited.is_empty());
    }

    #[test]
    fn base_only_files_are_inherited() {
        let r = resolver(InheritanceRules::default());
        let resolution = r
            .resolve_entries(vec![entry("README.md", TierSource::Base)])
            .unwrap();
        assert_eq!(resolution.inherited, vec!["README.md"]);
        assert!(resolution.overridden.is_empty());
    }

    #[test]
    fn never_inherit_base_only_yields_nothing() {
        let rules = InheritanceRules {
            never_inherit: vec![".env*".into()],
            ..Default::default()
        };
        let r = resolver(rules);
        let resolution = r
            .resolve_entries(vec![entry(".env.example", TierSource::Base)])
            .unwrap();
        assert!(resolution.files.is_empty());
    }

    #[test]
    fn never_inherit_keeps_overlay_version() {
        let rules = InheritanceRules {
            never_inherit: vec![".env*".into()],
            ..Default::default()
        };
        let r = resolver(rules);
        let resolution = r
            .resolve_entries(vec![
                entry(".env.example", TierSource::Base),
                entry(".env.example", TierSource::Template),
            ])
            .unwrap();
        assert_eq!(resolution.files.len(), 1);
        assert_eq!(resolution.files[0].source, TierSource::Template);
    }

    #[test]
    fn always_inherit_base_survives_alone() {
        let rules = InheritanceRules {
            always_inherit: vec!["LICENSE".into()],
            ..Default::default()
        };
        let r = resolver(rules);
        let resolution = r
            .resolve_entries(vec![entry("LICENSE", TierSource::Base)])
            .unwrap();
        assert_eq!(resolution.files[0].source, TierSource::Base);
    }

    #[test]
    fn base_wins_policy_prefers_lowest_tier() {
        let r = resolver(InheritanceRules::with_policy(ConflictPolicy::BaseWins));
        let resolution = r
            .resolve_entries(vec![
                entry("a.txt", TierSource::Base),
                entry("a.txt", TierSource::Feature),
            ])
            .unwrap();
        assert_eq!(resolution.files[0].source, TierSource::Base);
    }

    #[test]
    fn error_policy_names_all_sources() {
        let r = resolver(InheritanceRules::with_policy(ConflictPolicy::Error));
        let err = r
            .resolve_entries(vec![
                entry("a.txt", TierSource::Base),
                entry("a.txt", TierSource::Template),
            ])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a.txt"));
        assert!(msg.contains("base"));
        assert!(msg.contains("template"));
    }

    #[test]
    fn merge_policy_warns_and_falls_back() {
        let r = resolver(InheritanceRules::with_policy(ConflictPolicy::Merge));
        let resolution = r
            .resolve_entries(vec![
                entry("a.txt", TierSource::Base),
                entry("a.txt", TierSource::Template),
            ])
            .unwrap();
        assert_eq!(resolution.files[0].source, TierSource::Template);
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn later_feature_wins_same_priority_tie() {
        let r = resolver(InheritanceRules::default());
        let first = TemplateFileInfo::new("/store/features/auth/cfg.ts", "cfg.ts", TierSource::Feature);
        let second =
            TemplateFileInfo::new("/store/features/payments/cfg.ts", "cfg.ts", TierSource::Feature);
        let resolution = r.resolve_entries(vec![first, second.clone()]).unwrap();
        assert_eq!(resolution.files[0].path, second.path);
    }

    #[test]
    fn base_manifest_is_diverted_to_merger() {
        let r = resolver(InheritanceRules::default());
        let resolution = r
            .resolve_entries(vec![
                entry("package.json.hbs", TierSource::Base),
                entry("package.json.hbs", TierSource::Template),
            ])
            .unwrap();
        // Both manifests reach the merger; only the template one is written.
        assert_eq!(resolution.manifests.len(), 2);
        assert_eq!(resolution.files.len(), 1);
        assert_eq!(resolution.files[0].source, TierSource::Template);
    }

    #[test]
    fn manifest_detection_handles_suffix_and_depth() {
        assert!(is_manifest_path("package.json"));
        assert!(is_manifest_path("apps/api/package.json.hbs"));
        assert!(!is_manifest_path("package.json.bak"));
        assert!(!is_manifest_path("docs/package.json.md"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = resolver(InheritanceRules::default());
        let entries = vec![
            entry("src/a.ts.hbs", TierSource::Base),
            entry("src/a.ts.hbs", TierSource::Template),
            entry("src/b.ts.hbs", TierSource::Feature),
        ];
        let first = r.resolve_entries(entries.clone()).unwrap();
        let second = r.resolve_entries(entries).unwrap();
        assert_eq!(first.files, second.files);
        assert_eq!(first.inherited, second.inherited);
        assert_eq!(first.overridden, second.overridden);
    }
}
