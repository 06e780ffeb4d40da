//! Integration tests for strata-core.
//!
//! The ports are backed by in-memory fakes so the whole pipeline runs
//! without touching a real filesystem or template engine: a map-backed
//! filesystem with a write counter, a discoverer that walks that map, and a
//! renderer that does plain placeholder substitution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use strata_core::application::ports::{
    ContentRenderer, FileDiscoverer, Filesystem, RenderCacheStats, RenderOutcome,
};
use strata_core::application::{GenerateOptions, InheritanceResolver, ProjectGenerator};
use strata_core::domain::{
    ConflictSeverity, InheritanceRules, ProjectContext, TemplateFileInfo, TierSource,
};
use strata_core::error::{StrataError, StrataResult};

// ============================================================================
// In-memory fakes
// ============================================================================

#[derive(Default)]
struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryFs {
    fn seed(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.as_bytes().to_vec());
    }

    fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn content(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(Path::new(path))
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl Filesystem for MemoryFs {
    fn create_dir_all(&self, _path: &Path) -> StrataResult<()> {
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> StrataResult<String> {
        self.read(path).map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    fn read(&self, path: &Path) -> StrataResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StrataError::Internal {
                message: format!("not found: {}", path.display()),
            })
    }

    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()> {
        self.write_bytes(path, content.as_bytes())
    }

    fn write_bytes(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.keys().any(|k| k == path || k.starts_with(path))
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        self.files
            .lock()
            .unwrap()
            .retain(|k, _| !k.starts_with(path));
        Ok(())
    }
}

/// Walks the map-backed filesystem under a tier root.
struct MapDiscoverer {
    fs: Arc<MemoryFs>,
}

impl FileDiscoverer for MapDiscoverer {
    fn discover(&self, tier_root: &Path, source: TierSource) -> StrataResult<Vec<TemplateFileInfo>> {
        let files = self.fs.files.lock().unwrap();
        let mut out = Vec::new();
        for path in files.keys() {
            if let Ok(rel) = path.strip_prefix(tier_root) {
                let rel = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push(TemplateFileInfo::new(path.clone(), rel, source));
            }
        }
        Ok(out)
    }
}

/// Substitutes `{{project_name}}` / `{{project_name_kebab}}` and nothing
/// else. Good enough to prove the orchestration plumbing.
#[derive(Default)]
struct SubstRenderer;

impl ContentRenderer for SubstRenderer {
    fn preflight(&self, _relative_path: &str, _content: &str) -> Vec<strata_core::domain::TemplateDiagnostic> {
        Vec::new()
    }

    fn render(
        &self,
        _relative_path: &str,
        content: &str,
        context: &ProjectContext,
    ) -> StrataResult<RenderOutcome> {
        let content = content
            .replace("{{project_name_kebab}}", &context.project_name_kebab)
            .replace("{{project_name}}", &context.project_name);
        Ok(RenderOutcome {
            content,
            diagnostics: Vec::new(),
        })
    }

    fn cache_stats(&self) -> RenderCacheStats {
        RenderCacheStats::default()
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    fs: Arc<MemoryFs>,
    generator: ProjectGenerator,
}

fn harness() -> Harness {
    let fs = Arc::new(MemoryFs::default());
    let discoverer = Arc::new(MapDiscoverer { fs: fs.clone() });
    let resolver = InheritanceResolver::new(
        discoverer,
        fs.clone(),
        "/store",
        InheritanceRules::default(),
    );
    let generator = ProjectGenerator::new(resolver, Arc::new(SubstRenderer), fs.clone());
    Harness { fs, generator }
}

fn seed_minimal_template(h: &Harness) {
    h.fs.seed("/store/templates/saas/src/index.ts.hbs", "// {{project_name}}\n");
    h.fs.seed("/store/base/README.md", "# readme\n");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn resolution_is_idempotent_end_to_end() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/store/base/src/index.ts.hbs", "// base\n");
    let ctx = ProjectContext::new("app", "saas");

    let opts = GenerateOptions {
        dry_run: true,
        ..Default::default()
    };
    let first = h.generator.generate(&ctx, "/out/app", &opts).unwrap();
    let second = h.generator.generate(&ctx, "/out/app", &opts).unwrap();
    assert_eq!(first.generated, second.generated);
    assert_eq!(first.inherited, second.inherited);
    assert_eq!(first.overridden, second.overridden);
}

#[test]
fn feature_tier_beats_base_tier() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/store/base/src/config.ts.hbs", "// base config\n");
    h.fs.seed("/store/features/docs/src/config.ts.hbs", "// docs config\n");
    let ctx = ProjectContext::new("app", "saas").with_feature("docs");

    h.generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();

    let written = h.fs.content("/out/app/src/config.ts").unwrap();
    assert_eq!(written, "// docs config\n");
}

#[test]
fn dry_run_matches_real_run_with_zero_writes() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/store/templates/saas/src/auth/login.ts.hbs", "// login\n");
    let ctx = ProjectContext::new("app", "saas"); // auth off, subtree skipped

    let dry = h
        .generator
        .generate(
            &ctx,
            "/out/app",
            &GenerateOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(h.fs.write_count(), 0);

    let real = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();
    assert_eq!(dry.generated, real.generated);
    assert_eq!(dry.skipped, real.skipped);
    assert_eq!(h.fs.write_count(), real.generated.len());
}

#[test]
fn missing_template_is_fatal_and_names_searched_path() {
    let h = harness();
    let ctx = ProjectContext::new("app", "nope");
    let err = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("nope"));
    assert!(msg.contains("/store/templates/nope"));
}

#[test]
fn missing_feature_overlay_contributes_nothing() {
    let h = harness();
    seed_minimal_template(&h);
    let ctx = ProjectContext::new("app", "saas").with_feature("payments");
    let report = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();
    assert!(report.generated.contains(&"src/index.ts".to_string()));
}

// ============================================================================
// Dependency merge scenarios
// ============================================================================

#[test]
fn identical_versions_merge_cleanly_with_extra_packages() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed(
        "/store/base/package.json.hbs",
        r#"{"name": "base", "dependencies": {"react": "^18.2.0"}}"#,
    );
    h.fs.seed(
        "/store/templates/saas/package.json.hbs",
        r#"{"name": "{{project_name_kebab}}", "dependencies": {"react": "^18.2.0", "zustand": "^4.4.0"}}"#,
    );
    let ctx = ProjectContext::new("My App", "saas");

    let report = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();

    assert!(report.validation.conflicts.is_empty());
    assert_eq!(report.validation.dependencies["react"], "^18.2.0");
    assert_eq!(report.validation.dependencies["zustand"], "^4.4.0");
    // Duplicate identical version is a notice, not a conflict.
    assert!(report.warnings.iter().any(|w| w.contains("react")));

    let manifest = h.fs.content("/out/app/package.json").unwrap();
    assert!(manifest.contains("\"my-app\""));
    assert!(manifest.contains("\"zustand\": \"^4.4.0\""));
}

#[test]
fn version_disagreement_without_overrides_aborts_before_writes() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed(
        "/store/base/package.json.hbs",
        r#"{"dependencies": {"react": "^18.2.0"}}"#,
    );
    h.fs.seed(
        "/store/templates/saas/package.json.hbs",
        r#"{"dependencies": {"react": "^17.0.0"}}"#,
    );
    let ctx = ProjectContext::new("app", "saas");

    let err = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("react"));
    assert_eq!(h.fs.write_count(), 0);
}

#[test]
fn disagreement_with_overrides_resolves_to_overlay() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed(
        "/store/base/package.json.hbs",
        r#"{"dependencies": {"react": "^18.2.0"}}"#,
    );
    h.fs.seed(
        "/store/templates/saas/package.json.hbs",
        r#"{"dependencies": {"react": "^17.0.0"}}"#,
    );
    let ctx = ProjectContext::new("app", "saas");

    let mut opts = GenerateOptions::default();
    opts.dependency_validation.allow_overrides = true;
    let report = h.generator.generate(&ctx, "/out/app", &opts).unwrap();

    assert_eq!(report.validation.conflicts.len(), 1);
    assert_eq!(
        report.validation.conflicts[0].severity,
        ConflictSeverity::Warning
    );
    let manifest = h.fs.content("/out/app/package.json").unwrap();
    assert!(manifest.contains("\"react\": \"^17.0.0\""));
}

// ============================================================================
// Order-dependent overlay conflicts
// ============================================================================

#[test]
fn later_feature_in_context_order_wins_same_path() {
    let h = harness();
    h.fs.seed("/store/templates/ai-chat/src/index.ts.hbs", "// app\n");
    h.fs.seed("/store/features/ai/src/config.ts.hbs", "// ai config\n");
    h.fs.seed("/store/features/realtime/src/config.ts.hbs", "// realtime config\n");

    let ctx = ProjectContext::new("chat", "ai-chat")
        .with_feature("ai")
        .with_feature("realtime");
    h.generator
        .generate(&ctx, "/out/chat", &GenerateOptions::default())
        .unwrap();
    assert_eq!(
        h.fs.content("/out/chat/src/config.ts").unwrap(),
        "// realtime config\n"
    );

    // Reversed list order flips the winner.
    let h = harness();
    h.fs.seed("/store/templates/ai-chat/src/index.ts.hbs", "// app\n");
    h.fs.seed("/store/features/ai/src/config.ts.hbs", "// ai config\n");
    h.fs.seed("/store/features/realtime/src/config.ts.hbs", "// realtime config\n");
    let ctx = ProjectContext::new("chat", "ai-chat")
        .with_feature("realtime")
        .with_feature("ai");
    h.generator
        .generate(&ctx, "/out/chat", &GenerateOptions::default())
        .unwrap();
    assert_eq!(
        h.fs.content("/out/chat/src/config.ts").unwrap(),
        "// ai config\n"
    );
}

// ============================================================================
// Writer behavior
// ============================================================================

#[test]
fn static_files_are_copied_verbatim() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/store/templates/saas/logo.svg", "<svg>{{not a template}}</svg>");
    let ctx = ProjectContext::new("app", "saas");

    let report = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();
    assert!(report.metrics.files_copied >= 1);
    assert_eq!(
        h.fs.content("/out/app/logo.svg").unwrap(),
        "<svg>{{not a template}}</svg>"
    );
}

#[test]
fn existing_output_directory_is_refused() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/out/app/keep.txt", "existing");
    let ctx = ProjectContext::new("app", "saas");
    let err = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn report_counts_add_up() {
    let h = harness();
    seed_minimal_template(&h);
    h.fs.seed("/store/base/src/index.ts.hbs", "// base\n");
    h.fs.seed("/store/templates/saas/src/auth/login.ts.hbs", "// login\n");
    let ctx = ProjectContext::new("app", "saas"); // auth off

    let report = h
        .generator
        .generate(&ctx, "/out/app", &GenerateOptions::default())
        .unwrap();

    assert_eq!(
        report.metrics.files_processed,
        report.generated.len() + report.skipped.len()
    );
    assert_eq!(report.skipped, vec!["src/auth/login.ts"]);
    assert_eq!(report.overridden, vec!["src/index.ts"]);
    assert_eq!(report.inherited, vec!["README.md"]);
}
