//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use strata_core::domain::{ConflictPolicy, Database, Environment};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Layered project scaffolding",
    long_about = "Strata generates projects from a three-tier template store: \
                  a shared base, a named template, and optional feature \
                  overlays, merged by inheritance rules.",
    after_help = "EXAMPLES:\n\
        \x20 strata new my-shop --template ecommerce --features auth,payments\n\
        \x20 strata new my-api  --template saas --database postgresql --api-only\n\
        \x20 strata list\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project from a template.
    #[command(
        visible_alias = "n",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 strata new my-shop --template ecommerce --features auth,payments\n\
            \x20 strata new my-blog --template blog --database sqlite --dry-run\n\
            \x20 strata new my-api  --template saas --api-only --policy base-wins"
    )]
    New(NewArgs),

    /// List templates and feature overlays in the store.
    #[command(
        visible_alias = "ls",
        about = "List available templates and features",
        after_help = "EXAMPLES:\n\
            \x20 strata list\n\
            \x20 strata list --format json\n\
            \x20 strata list --store ./my-store"
    )]
    List(ListArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `strata new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Project name or path.  A plain name creates `./name`; a path like
    /// `../foo` places the project one level up.
    #[arg(value_name = "NAME", help = "Project name or path")]
    pub name: String,

    /// Template to instantiate (a directory under `<store>/templates/`).
    #[arg(
        short = 't',
        long = "template",
        value_name = "TEMPLATE",
        help = "Template name from the store"
    )]
    pub template: String,

    /// Feature overlays to apply, in order.  Later features win conflicts
    /// at equal tier.
    #[arg(
        short = 'f',
        long = "features",
        value_name = "FEATURES",
        value_delimiter = ',',
        help = "Comma-separated feature overlays (e.g. auth,payments)"
    )]
    pub features: Vec<String>,

    /// Database the generated project targets.
    #[arg(
        short = 'd',
        long = "database",
        value_name = "DB",
        help = "Database: mongodb, postgresql, sqlite, none"
    )]
    pub database: Option<String>,

    /// Deployment environment baked into the generated config.
    #[arg(
        short = 'e',
        long = "env",
        value_name = "ENV",
        help = "Environment: development, staging, production"
    )]
    pub environment: Option<String>,

    /// Generate a backend-only project; frontend trees are skipped.
    #[arg(long = "api-only", help = "Skip frontend directories")]
    pub api_only: bool,

    /// Include Docker assets.
    #[arg(long = "docker", help = "Enable the docker toggle")]
    pub docker: bool,

    /// Leave test scaffolding out of the generated project.
    #[arg(long = "no-testing", help = "Disable the testing toggle")]
    pub no_testing: bool,

    /// Skip git-related files in the generated project.
    #[arg(long = "no-git", help = "Disable the git toggle")]
    pub no_git: bool,

    /// Mark the project for dependency installation in the next steps.
    #[arg(long = "install", help = "Enable the install toggle")]
    pub install: bool,

    /// Enable the AI subtree with the given provider.
    #[arg(
        long = "ai-provider",
        value_name = "PROVIDER",
        help = "Enable AI scaffolding with this provider (e.g. openai, ollama)"
    )]
    pub ai_provider: Option<String>,

    /// Model identifier passed through to generated AI config.
    #[arg(
        long = "ai-model",
        value_name = "MODEL",
        requires = "ai_provider",
        help = "Default model for the AI provider"
    )]
    pub ai_model: Option<String>,

    /// Conflict resolution policy between tiers.
    #[arg(
        long = "policy",
        value_enum,
        value_name = "POLICY",
        help = "Conflict policy: template-wins, base-wins, error, merge"
    )]
    pub policy: Option<PolicyArg>,

    /// Permit feature manifests to override base dependency versions.
    #[arg(
        long = "allow-overrides",
        help = "Allow overlays to override base dependency versions"
    )]
    pub allow_overrides: bool,

    /// Permit overriding a single named package (repeatable).
    #[arg(
        long = "allow-override",
        value_name = "PACKAGE",
        help = "Allow overriding one package version (repeatable)"
    )]
    pub allowed_overrides: Vec<String>,

    /// Downgrade dependency conflicts from errors to warnings.
    #[arg(long = "warn-only", help = "Report dependency conflicts without failing")]
    pub warn_only: bool,

    /// Skip dependency validation entirely.
    #[arg(long = "skip-dep-check", help = "Skip manifest dependency validation")]
    pub skip_dep_check: bool,

    /// Template store location (overrides config and STRATA_STORE).
    #[arg(
        long = "store",
        value_name = "DIR",
        env = "STRATA_STORE",
        help = "Template store directory"
    )]
    pub store: Option<PathBuf>,

    /// Files rendered concurrently per batch.
    #[arg(
        long = "batch-size",
        value_name = "N",
        help = "Files rendered concurrently per batch"
    )]
    pub batch_size: Option<usize>,

    /// Skip the confirmation prompt.
    #[arg(
        short = 'y',
        long = "yes",
        help = "Skip confirmation and create immediately"
    )]
    pub yes: bool,

    /// Overwrite an existing directory (destructive).
    #[arg(long = "force", help = "Overwrite existing directory")]
    pub force: bool,

    /// Preview what would be created without writing any files.
    #[arg(long = "dry-run", help = "Show what would be created without creating")]
    pub dry_run: bool,
}

/// Conflict policy as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum PolicyArg {
    TemplateWins,
    BaseWins,
    Error,
    Merge,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::TemplateWins => Self::TemplateWins,
            PolicyArg::BaseWins => Self::BaseWins,
            PolicyArg::Error => Self::Error,
            PolicyArg::Merge => Self::Merge,
        }
    }
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Template store location.
    #[arg(
        long = "store",
        value_name = "DIR",
        env = "STRATA_STORE",
        help = "Template store directory"
    )]
    pub store: Option<PathBuf>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON object with templates and features.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `strata completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── helpers ───────────────────────────────────────────────────────────────────

impl NewArgs {
    /// Parse the `--database` flag through the domain parser.
    pub fn parse_database(&self) -> Result<Option<Database>, strata_core::domain::DomainError> {
        self.database.as_deref().map(Database::parse).transpose()
    }

    /// Parse the `--env` flag through the domain parser.
    pub fn parse_environment(
        &self,
    ) -> Result<Option<Environment>, strata_core::domain::DomainError> {
        self.environment.as_deref().map(Environment::parse).transpose()
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
