//! Project Generator - main application orchestrator.
//!
//! This service coordinates the entire generation workflow:
//! 1. Validate the context
//! 2. Resolve the three-tier file set
//! 3. Validate and merge dependency manifests (fatal conflicts abort here,
//!    before anything touches the output directory)
//! 4. Render/copy the winners in batches and write them out
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{ContentRenderer, Filesystem},
        services::manifest::{DependencyValidator, ManifestSource},
        services::resolver::{InheritanceResolver, Resolution, is_manifest_path},
    },
    domain::{
        DependencyValidationOptions, DomainError, ProjectContext, TemplateDiagnostic,
        TemplateFileInfo, ValidationResult,
    },
    error::{StrataError, StrataResult},
};

/// Default number of files rendered per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Knobs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Compute the full report without writing anything.
    pub dry_run: bool,
    /// Files rendered concurrently per batch.
    pub batch_size: usize,
    pub dependency_validation: DependencyValidationOptions,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: DEFAULT_BATCH_SIZE,
            dependency_validation: DependencyValidationOptions::default(),
        }
    }
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationMetrics {
    pub files_processed: usize,
    pub files_rendered: usize,
    pub files_copied: usize,
    pub files_skipped: usize,
    pub elapsed_ms: u128,
    /// Compiled-template cache hit ratio in `[0, 1]`.
    pub cache_hit_ratio: f64,
}

/// Everything a caller learns from one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Output paths written (or that would be written, under dry-run).
    pub generated: Vec<String>,
    /// Output paths excluded by the inclusion predicates.
    pub skipped: Vec<String>,
    /// Output paths taken from base untouched.
    pub inherited: Vec<String>,
    /// Output paths where a higher tier displaced a lower one.
    pub overridden: Vec<String>,
    pub warnings: Vec<String>,
    pub diagnostics: Vec<TemplateDiagnostic>,
    pub validation: ValidationResult,
    pub metrics: GenerationMetrics,
}

/// One file after rendering, ready to write.
enum RenderedFile {
    Text { output: String, content: String },
    Bytes { output: String, content: Vec<u8> },
}

impl RenderedFile {
    fn output_path(&self) -> &str {
        match self {
            Self::Text { output, .. } | Self::Bytes { output, .. } => output,
        }
    }
}

/// Main generation service.
///
/// Orchestrates resolution, dependency validation, rendering, and writing.
pub struct ProjectGenerator {
    resolver: InheritanceResolver,
    validator: DependencyValidator,
    renderer: Arc<dyn ContentRenderer>,
    filesystem: Arc<dyn Filesystem>,
}

impl ProjectGenerator {
    /// Create a new generator with the given adapters.
    pub fn new(
        resolver: InheritanceResolver,
        renderer: Arc<dyn ContentRenderer>,
        filesystem: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            resolver,
            validator: DependencyValidator::new(),
            renderer,
            filesystem,
        }
    }

    /// Generate a project.
    ///
    /// This is the main use case - resolves the tier chain for
    /// `context.template` and materializes it at `output_path`.
    #[instrument(
        skip_all,
        fields(
            template = %context.template,
            project = %context.project_name,
            output_path = %output_path.as_ref().display(),
            dry_run = options.dry_run
        )
    )]
    pub fn generate(
        &self,
        context: &ProjectContext,
        output_path: impl AsRef<Path>,
        options: &GenerateOptions,
    ) -> StrataResult<GenerationReport> {
        let started = Instant::now();
        let output_path = output_path.as_ref();

        // 1. Validate context
        context.validate()?;

        if !options.dry_run && self.filesystem.exists(output_path) {
            return Err(ApplicationError::ProjectExists {
                path: output_path.to_path_buf(),
            }
            .into());
        }

        // 2. Resolve tiers
        let resolution = self.resolver.resolve(&context.template, context)?;
        info!(
            files = resolution.files.len(),
            manifests = resolution.manifests.len(),
            "Tier resolution complete"
        );

        // 3. Validate dependencies. Error-severity conflicts abort before any
        // write happens.
        let validation = self.validate_dependencies(&resolution, options)?;
        if !validation.valid {
            let details: Vec<String> =
                validation.error_conflicts().map(|c| c.describe()).collect();
            return Err(DomainError::DependencyConflicts {
                count: details.len(),
                details: details.join("\n"),
            }
            .into());
        }

        // 4. Partition by the inclusion predicates
        let (included, skipped): (Vec<_>, Vec<_>) = resolution
            .files
            .iter()
            .cloned()
            .partition(|f| include_file(f, context));

        let mut report = GenerationReport {
            generated: included.iter().map(|f| f.output_path().to_string()).collect(),
            skipped: skipped.iter().map(|f| f.output_path().to_string()).collect(),
            inherited: resolution.inherited.clone(),
            overridden: resolution.overridden.clone(),
            warnings: resolution.warnings.clone(),
            validation,
            ..Default::default()
        };
        report.warnings.extend(report.validation.warnings.clone());
        report.metrics.files_processed = resolution.files.len();
        report.metrics.files_skipped = report.skipped.len();

        // 5. Render and write, unless this is a rehearsal. A dry run still
        // preflights the renderable files so template problems surface in
        // the report without any write happening.
        if options.dry_run {
            for file in included.iter().filter(|f| f.is_renderable) {
                let source = self.filesystem.read_to_string(&file.path)?;
                report
                    .diagnostics
                    .extend(self.renderer.preflight(&file.relative_path, &source));
            }
            info!("Dry run, nothing written");
        } else {
            let tables = MergedTables {
                dependencies: report.validation.dependencies.clone(),
                dev_dependencies: report.validation.dev_dependencies.clone(),
            };
            self.materialize(&included, context, output_path, options, &tables, &mut report)?;
        }

        report.metrics.elapsed_ms = started.elapsed().as_millis();
        report.metrics.cache_hit_ratio = self.renderer.cache_stats().hit_ratio();
        info!(
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            elapsed_ms = report.metrics.elapsed_ms,
            "Generation complete"
        );
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn validate_dependencies(
        &self,
        resolution: &Resolution,
        options: &GenerateOptions,
    ) -> StrataResult<ValidationResult> {
        if options.dependency_validation.skip_validation || resolution.manifests.is_empty() {
            return Ok(ValidationResult::passed());
        }

        let mut sources = Vec::with_capacity(resolution.manifests.len());
        for manifest in &resolution.manifests {
            let content = self.filesystem.read_to_string(&manifest.path)?;
            sources.push(ManifestSource {
                relative_path: manifest.relative_path.clone(),
                tier: manifest.source,
                label: tier_label(manifest),
                content,
            });
        }

        Ok(self
            .validator
            .validate_and_merge(&sources, &options.dependency_validation))
    }

    /// Render the included files batch by batch and write the results.
    fn materialize(
        &self,
        files: &[TemplateFileInfo],
        context: &ProjectContext,
        output_path: &Path,
        options: &GenerateOptions,
        tables: &MergedTables,
        report: &mut GenerationReport,
    ) -> StrataResult<()> {
        self.filesystem.create_dir_all(output_path)?;
        let batch_size = options.batch_size.max(1);

        for batch in files.chunks(batch_size) {
            let rendered = self.render_batch(batch, context, tables)?;
            for (file, outcome) in batch.iter().zip(rendered) {
                let (item, diagnostics) = outcome;
                report.diagnostics.extend(diagnostics);
                self.write_file(output_path, &item)?;
                match item {
                    RenderedFile::Text { .. } if file.is_renderable => {
                        report.metrics.files_rendered += 1
                    }
                    _ => report.metrics.files_copied += 1,
                }
            }
        }

        Ok(())
    }

    /// Render one batch concurrently on scoped threads. Reads happen inside
    /// the workers; writes stay sequential on the caller.
    fn render_batch(
        &self,
        batch: &[TemplateFileInfo],
        context: &ProjectContext,
        tables: &MergedTables,
    ) -> StrataResult<Vec<(RenderedFile, Vec<TemplateDiagnostic>)>> {
        let results: Vec<StrataResult<(RenderedFile, Vec<TemplateDiagnostic>)>> =
            std::thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|file| scope.spawn(move || self.render_one(file, context, tables)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| match h.join() {
                        Ok(result) => result,
                        Err(_) => Err(StrataError::Internal {
                            message: "render worker panicked".into(),
                        }),
                    })
                    .collect()
            });
        results.into_iter().collect()
    }

    fn render_one(
        &self,
        file: &TemplateFileInfo,
        context: &ProjectContext,
        tables: &MergedTables,
    ) -> StrataResult<(RenderedFile, Vec<TemplateDiagnostic>)> {
        let output = file.output_path().to_string();

        if !file.is_renderable {
            let content = self.filesystem.read(&file.path)?;
            return Ok((RenderedFile::Bytes { output, content }, Vec::new()));
        }

        let source = self.filesystem.read_to_string(&file.path)?;
        let outcome = self
            .renderer
            .render(&file.relative_path, &source, context)?;

        let mut content = outcome.content;
        if is_manifest_path(&file.relative_path) {
            content = patch_manifest(&file.relative_path, content, tables)?;
        }

        Ok((RenderedFile::Text { output, content }, outcome.diagnostics))
    }

    fn write_file(&self, output_path: &Path, item: &RenderedFile) -> StrataResult<()> {
        let target = join_output(output_path, item.output_path());
        if let Some(parent) = target.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        match item {
            RenderedFile::Text { content, .. } => self.filesystem.write_file(&target, content),
            RenderedFile::Bytes { content, .. } => self.filesystem.write_bytes(&target, content),
        }
    }
}

/// Merged dependency tables from the validation pass, threaded through the
/// render workers so the winning manifest can be patched.
#[derive(Debug, Clone, Default)]
struct MergedTables {
    dependencies: std::collections::BTreeMap<String, String>,
    dev_dependencies: std::collections::BTreeMap<String, String>,
}

impl MergedTables {
    fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}

/// Splice the merged dependency tables into the rendered winning manifest.
/// A manifest that does not parse after rendering is written as-is; the
/// warning surfaces in logs.
fn patch_manifest(
    relative_path: &str,
    rendered: String,
    tables: &MergedTables,
) -> StrataResult<String> {
    if tables.is_empty() {
        return Ok(rendered);
    }
    match serde_json::from_str::<serde_json::Value>(&rendered) {
        Ok(mut value) => {
            if let Some(obj) = value.as_object_mut() {
                if !tables.dependencies.is_empty() {
                    obj.insert("dependencies".into(), map_to_json(&tables.dependencies));
                }
                if !tables.dev_dependencies.is_empty() {
                    obj.insert(
                        "devDependencies".into(),
                        map_to_json(&tables.dev_dependencies),
                    );
                }
            }
            let mut out =
                serde_json::to_string_pretty(&value).map_err(|e| StrataError::Internal {
                    message: format!("manifest serialization failed: {e}"),
                })?;
            out.push('\n');
            Ok(out)
        }
        Err(e) => {
            warn!(path = relative_path, error = %e, "rendered manifest is not valid JSON, writing unpatched");
            Ok(rendered)
        }
    }
}

fn join_output(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in relative.split('/') {
        path.push(segment);
    }
    path
}

fn map_to_json(map: &std::collections::BTreeMap<String, String>) -> serde_json::Value {
    serde_json::Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

fn tier_label(manifest: &TemplateFileInfo) -> String {
    use crate::domain::TierSource;
    match manifest.source {
        TierSource::Base => "base".into(),
        TierSource::Template => "template".into(),
        // features/<name>/... in the store; fall back to the tier name when
        // the path does not follow the layout (synthetic tests).
        TierSource::Feature => feature_name(&manifest.path).unwrap_or_else(|| "feature".into()),
    }
}

fn feature_name(path: &Path) -> Option<String> {
    let mut components = path.components().map(|c| c.as_os_str().to_string_lossy());
    while let Some(component) = components.next() {
        if component == super::resolver::FEATURES_DIR {
            return components.next().map(|c| c.into_owned());
        }
    }
    None
}

/// Per-file inclusion predicate.
///
/// Frontend trees are dropped for API-only projects; feature subtrees are
/// dropped when the matching feature is off. Matching is on path segments,
/// not substrings, so `chai/` does not trip the `ai` rule.
fn include_file(file: &TemplateFileInfo, context: &ProjectContext) -> bool {
    let path = &file.relative_path;

    if context.toggles.api_only && (has_prefix(path, &["apps", "web"]) || has_prefix(path, &["frontend"])) {
        return false;
    }

    for feature in ["auth", "payments", "realtime"] {
        if has_segment(path, feature) && !context.has_feature(feature) {
            return false;
        }
    }
    if has_segment(path, "ai") && !(context.has_feature("ai") || context.ai.enabled) {
        return false;
    }

    true
}

fn has_prefix(path: &str, prefix: &[&str]) -> bool {
    let mut segments = path.split('/');
    prefix.iter().all(|p| segments.next() == Some(*p))
}

/// True when `name` appears as a directory segment (never the file name).
fn has_segment(path: &str, name: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    segments.iter().any(|s| *s == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TierSource;

    fn file(rel: &str) -> TemplateFileInfo {
        TemplateFileInfo::new(format!("/store/base/{rel}"), rel, TierSource::Base)
    }

    #[test]
    fn api_only_skips_frontend_trees() {
        let mut ctx = ProjectContext::new("app", "saas");
        ctx.toggles.api_only = true;
        assert!(!include_file(&file("apps/web/index.tsx.hbs"), &ctx));
        assert!(!include_file(&file("frontend/App.tsx.hbs"), &ctx));
        assert!(include_file(&file("apps/api/server.ts.hbs"), &ctx));
    }

    #[test]
    fn feature_subtrees_follow_feature_flags() {
        let ctx = ProjectContext::new("app", "saas").with_feature("auth");
        assert!(include_file(&file("src/auth/login.ts.hbs"), &ctx));
        assert!(!include_file(&file("src/payments/stripe.ts.hbs"), &ctx));
        assert!(!include_file(&file("src/realtime/socket.ts.hbs"), &ctx));
    }

    #[test]
    fn ai_subtree_honors_settings_block_too() {
        let mut ctx = ProjectContext::new("app", "saas");
        assert!(!include_file(&file("src/ai/agent.ts.hbs"), &ctx));
        ctx.ai.enabled = true;
        assert!(include_file(&file("src/ai/agent.ts.hbs"), &ctx));
    }

    #[test]
    fn segment_matching_does_not_catch_substrings() {
        let ctx = ProjectContext::new("app", "saas");
        assert!(include_file(&file("src/chai/helper.ts.hbs"), &ctx));
        assert!(include_file(&file("src/ai.ts.hbs"), &ctx));
    }

    #[test]
    fn feature_name_extracted_from_store_path() {
        let path = PathBuf::from("/store/features/payments/src/stripe.ts.hbs");
        assert_eq!(feature_name(&path).as_deref(), Some("payments"));
        assert_eq!(feature_name(&PathBuf::from("/store/base/a.ts")), None);
    }

    #[test]
    fn output_join_respects_forward_slash_keys() {
        let joined = join_output(Path::new("/out"), "src/deep/file.ts");
        assert_eq!(joined, PathBuf::from("/out/src/deep/file.ts"));
    }
}
