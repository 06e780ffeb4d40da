//! Implementation of the `strata new` command.
//!
//! Responsibility: translate CLI arguments into a `ProjectContext`, call the
//! core generator, and display results. No business logic lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, instrument};

use strata_adapters::{HandlebarsRenderer, LocalFilesystem, WalkdirDiscoverer};
use strata_core::{
    application::{GenerateOptions, GenerationReport, InheritanceResolver, ProjectGenerator},
    domain::{AiSettings, DependencyValidationOptions, ProjectContext},
};

use crate::{
    cli::{NewArgs, OutputFormat, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `strata new` command.
///
/// Dispatch sequence:
/// 1. Parse and validate the project name / output path
/// 2. Convert CLI args to a core `ProjectContext`
/// 3. Confirm with user unless `--yes` or `--quiet`
/// 4. Wire the adapters and run the generator (dry-run aware)
/// 5. Print the report and next-steps guidance
#[instrument(skip_all, fields(project = %args.name, template = %args.template))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    // 1. Resolve project path
    let (project_name, project_path) = resolve_project_path(&args.name)?;
    validate_project_name(&project_name)?;

    let store = config.store_root(args.store.as_ref());
    if !store.is_dir() {
        return Err(CliError::StoreNotFound { path: store });
    }

    // 2. Build context
    let context = build_context(&project_name, &args, &config)?;

    debug!(
        template = %context.template,
        features = ?context.features,
        database = %serde_json::to_string(&context.database).unwrap_or_default(),
        api_only = context.toggles.api_only,
        "Context resolved"
    );

    // 3. Show configuration and confirm
    if !global.quiet && !args.yes && !args.dry_run {
        show_configuration(&context, &project_path, output)?;
        if !confirm()? {
            return Err(CliError::Cancelled);
        }
    }

    // 4. Check for existing directory. --force removes it first; the
    //    generator itself refuses to write into an existing path.
    if project_path.exists() {
        if args.force {
            std::fs::remove_dir_all(&project_path)?;
        } else if !args.dry_run {
            return Err(CliError::ProjectExists { path: project_path });
        }
    }

    // 5. Wire adapters and run
    let rules = config.inheritance_rules(args.policy.map(Into::into));
    let resolver = InheritanceResolver::new(
        Arc::new(WalkdirDiscoverer),
        Arc::new(LocalFilesystem::new()),
        store,
        rules,
    );
    let generator = ProjectGenerator::new(
        resolver,
        Arc::new(HandlebarsRenderer::new()),
        Arc::new(LocalFilesystem::new()),
    );

    let options = GenerateOptions {
        dry_run: args.dry_run,
        batch_size: args.batch_size.unwrap_or(strata_core::application::services::DEFAULT_BATCH_SIZE),
        dependency_validation: DependencyValidationOptions {
            allow_overrides: args.allow_overrides,
            allowed_overrides: args.allowed_overrides.clone(),
            warn_only: args.warn_only,
            skip_validation: args.skip_dep_check,
        },
    };

    let spinner = start_spinner(output, &project_name);
    info!(project = %project_name, path = %project_path.display(), "Generation started");

    let result = generator.generate(&context, &project_path, &options);

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let report = result.map_err(CliError::Core)?;
    info!(
        generated = report.generated.len(),
        skipped = report.skipped.len(),
        "Generation finished"
    );

    // 6. Report
    if output.format() == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".into())
        );
        return Ok(());
    }

    print_report(&report, &args, &project_name, &project_path, output)?;
    Ok(())
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Split a name-or-path argument into the project name and the full target
/// directory.  A plain `my-app` becomes `./my-app`.
pub fn resolve_project_path(name: &str) -> CliResult<(String, PathBuf)> {
    let path = Path::new(name);

    let project_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidProjectName {
            name: name.into(),
            reason: "cannot extract valid project name".into(),
        })?
        .to_string();

    Ok((project_name, path.to_path_buf()))
}

fn validate_project_name(name: &str) -> CliResult<()> {
    if name.is_empty() {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot be empty".into(),
        });
    }
    if name.starts_with('.') {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "name cannot start with '.'".into(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ' ')
    {
        return Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: "only letters, digits, hyphens, underscores, and spaces are allowed".into(),
        });
    }
    Ok(())
}

// ── Context construction ──────────────────────────────────────────────────────

fn build_context(name: &str, args: &NewArgs, config: &AppConfig) -> CliResult<ProjectContext> {
    let mut context = ProjectContext::new(name, &args.template);

    let features = if args.features.is_empty() {
        config.defaults.features.clone()
    } else {
        args.features.clone()
    };
    for feature in features {
        context = context.with_feature(feature);
    }

    if let Some(db) = args
        .parse_database()
        .map_err(|e| CliError::Core(e.into()))?
        .or(parse_default_database(config)?)
    {
        context = context.with_database(db);
    }

    if let Some(env) = args
        .parse_environment()
        .map_err(|e| CliError::Core(e.into()))?
        .or(parse_default_environment(config)?)
    {
        context = context.with_environment(env);
    }

    if let Some(provider) = &args.ai_provider {
        context = context.with_ai(AiSettings {
            enabled: true,
            provider: Some(provider.clone()),
            model: args.ai_model.clone(),
        });
    }

    context.toggles.api_only = args.api_only;
    context.toggles.docker = args.docker;
    context.toggles.testing = !args.no_testing;
    context.toggles.git = !args.no_git;
    context.toggles.install = args.install;

    // Fail fast on unknown features; the generator would catch this too but
    // the CLI message is cheaper to produce here.
    context.validate().map_err(|e| CliError::Core(e.into()))?;

    Ok(context)
}

fn parse_default_database(
    config: &AppConfig,
) -> CliResult<Option<strata_core::domain::Database>> {
    config
        .defaults
        .database
        .as_deref()
        .map(strata_core::domain::Database::parse)
        .transpose()
        .map_err(|e| CliError::ConfigError {
            message: e.to_string(),
        })
}

fn parse_default_environment(
    config: &AppConfig,
) -> CliResult<Option<strata_core::domain::Environment>> {
    config
        .defaults
        .environment
        .as_deref()
        .map(strata_core::domain::Environment::parse)
        .transpose()
        .map_err(|e| CliError::ConfigError {
            message: e.to_string(),
        })
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn show_configuration(
    context: &ProjectContext,
    project_path: &Path,
    out: &OutputManager,
) -> CliResult<()> {
    out.header("Configuration")?;
    out.print(&format!("  Project:      {}", context.project_name))?;
    out.print(&format!("  Template:     {}", context.template))?;
    if !context.features.is_empty() {
        out.print(&format!("  Features:     {}", context.features.join(", ")))?;
    }
    out.print(&format!("  Location:     {}", project_path.display()))?;
    out.print("")?;
    Ok(())
}

fn confirm() -> CliResult<bool> {
    use std::io::{self, Write};

    print!("Continue? [Y/n] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

fn start_spinner(output: &OutputManager, project_name: &str) -> Option<ProgressBar> {
    if output.is_quiet() || output.format() != OutputFormat::Human {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or(ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Creating '{project_name}'..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

fn print_report(
    report: &GenerationReport,
    args: &NewArgs,
    project_name: &str,
    project_path: &Path,
    output: &OutputManager,
) -> CliResult<()> {
    for warning in &report.warnings {
        output.warning(warning)?;
    }
    for diagnostic in &report.diagnostics {
        output.warning(&diagnostic.to_string())?;
    }

    if args.dry_run {
        output.header(&format!(
            "Dry run: '{project_name}' would contain {} files",
            report.generated.len()
        ))?;
        for file in &report.generated {
            output.print(&format!("  {file}"))?;
        }
        if !report.skipped.is_empty() {
            output.info(&format!(
                "{} files excluded by context toggles",
                report.skipped.len()
            ))?;
        }
        output.print("")?;
        output.info("No files were written.")?;
        return Ok(());
    }

    output.success(&format!(
        "Project '{}' created at {} ({} files, {} inherited from base)",
        project_name,
        project_path.display(),
        report.generated.len(),
        report.inherited.len(),
    ))?;

    if !output.is_quiet() {
        output.print("")?;
        output.print("Next steps:")?;
        output.print(&format!("  cd {}", project_path.display()))?;
        output.print("  npm install")?;
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn new_args(argv: &[&str]) -> NewArgs {
        let mut full = vec!["strata", "new"];
        full.extend_from_slice(argv);
        let Commands::New(args) = Cli::parse_from(full).command else {
            panic!("expected New command");
        };
        args
    }

    // ── resolve_project_path ─────────────────────────────────────────────

    #[test]
    fn simple_name_resolves_in_place() {
        let (name, dir) = resolve_project_path("my-app").unwrap();
        assert_eq!(name, "my-app");
        assert_eq!(dir, PathBuf::from("my-app"));
    }

    #[test]
    fn relative_path_keeps_full_target() {
        let (name, dir) = resolve_project_path("../my-app").unwrap();
        assert_eq!(name, "my-app");
        assert_eq!(dir, PathBuf::from("../my-app"));
    }

    #[test]
    fn nested_path_keeps_leaf_as_name() {
        let (name, dir) = resolve_project_path("./tmp/my-app").unwrap();
        assert_eq!(name, "my-app");
        assert_eq!(dir, PathBuf::from("./tmp/my-app"));
    }

    // ── validate_project_name ────────────────────────────────────────────

    #[test]
    fn empty_name_is_invalid() {
        assert!(matches!(
            validate_project_name(""),
            Err(CliError::InvalidProjectName { .. })
        ));
    }

    #[test]
    fn dotfile_name_is_invalid() {
        assert!(matches!(
            validate_project_name(".hidden"),
            Err(CliError::InvalidProjectName { .. })
        ));
    }

    #[test]
    fn shell_metacharacters_are_invalid() {
        assert!(validate_project_name("a;rm -rf").is_err());
        assert!(validate_project_name("a/b").is_err());
    }

    #[test]
    fn charset_rejection_names_the_allowed_characters() {
        let Err(CliError::InvalidProjectName { reason, .. }) = validate_project_name("my.app")
        else {
            panic!("expected InvalidProjectName");
        };
        assert!(reason.contains("spaces"), "got: {reason}");
    }

    #[test]
    fn valid_names_pass() {
        for name in &["my-shop", "my_app", "project123", "MyApp", "My Shop"] {
            assert!(validate_project_name(name).is_ok(), "failed for: {name}");
        }
    }

    // ── build_context ────────────────────────────────────────────────────

    #[test]
    fn context_carries_features_in_order() {
        let args = new_args(&["shop", "-t", "ecommerce", "-f", "auth,payments"]);
        let ctx = build_context("shop", &args, &AppConfig::default()).unwrap();
        assert_eq!(ctx.features, vec!["auth", "payments"]);
        assert_eq!(ctx.template, "ecommerce");
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let args = new_args(&["shop", "-t", "saas", "-f", "blockchain"]);
        assert!(build_context("shop", &args, &AppConfig::default()).is_err());
    }

    #[test]
    fn ai_provider_enables_ai_block() {
        let args = new_args(&["shop", "-t", "saas", "--ai-provider", "ollama"]);
        let ctx = build_context("shop", &args, &AppConfig::default()).unwrap();
        assert!(ctx.ai.enabled);
        assert_eq!(ctx.ai.provider.as_deref(), Some("ollama"));
    }

    #[test]
    fn config_defaults_fill_missing_flags() {
        let mut config = AppConfig::default();
        config.defaults.database = Some("sqlite".into());
        config.defaults.features = vec!["docs".into()];

        let args = new_args(&["shop", "-t", "blog"]);
        let ctx = build_context("shop", &args, &config).unwrap();
        assert_eq!(ctx.features, vec!["docs"]);
        assert_eq!(ctx.database, strata_core::domain::Database::SqLite);
    }

    #[test]
    fn flag_features_override_config_defaults() {
        let mut config = AppConfig::default();
        config.defaults.features = vec!["docs".into()];

        let args = new_args(&["shop", "-t", "blog", "-f", "auth"]);
        let ctx = build_context("shop", &args, &config).unwrap();
        assert_eq!(ctx.features, vec!["auth"]);
    }

    #[test]
    fn toggles_flow_from_flags() {
        let args = new_args(&["shop", "-t", "saas", "--api-only", "--docker", "--no-git"]);
        let ctx = build_context("shop", &args, &AppConfig::default()).unwrap();
        assert!(ctx.toggles.api_only);
        assert!(ctx.toggles.docker);
        assert!(!ctx.toggles.git);
        assert!(ctx.toggles.testing);
    }
}
