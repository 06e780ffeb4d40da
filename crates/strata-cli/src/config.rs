//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `STRATA_STORE` environment variable (store location only)
//! 3. Config file (`--config`, else the default location)
//! 4. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use strata_core::domain::{ConflictPolicy, InheritanceRules};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Template store settings.
    pub store: StoreConfig,
    /// Default context values for new projects.
    pub defaults: Defaults,
    /// Inheritance rule overrides.
    pub inheritance: InheritanceConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Template store root.  When unset, `STRATA_STORE` and then the
    /// platform data directory are consulted.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub template: Option<String>,
    pub database: Option<String>,
    pub environment: Option<String>,
    pub features: Vec<String>,
}

/// File-level inheritance rules as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InheritanceConfig {
    pub policy: Option<ConflictPolicy>,
    pub never_inherit: Vec<String>,
    pub always_inherit: Vec<String>,
    pub exclude_from_inheritance: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration from `config_file` (the `--config` value) or the
    /// default location.  A missing file yields the built-in defaults; a
    /// present but malformed file is an error.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let path = config_file.cloned().unwrap_or_else(Self::config_path);
        if !path.exists() {
            if config_file.is_some() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.strata.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".strata.toml"))
    }

    /// Resolve the template store root: CLI flag > config file > platform
    /// data directory.  The `STRATA_STORE` env var is picked up by clap on
    /// the flag itself.
    pub fn store_root(&self, flag: Option<&PathBuf>) -> PathBuf {
        if let Some(root) = flag {
            return root.clone();
        }
        if let Some(root) = &self.store.root {
            return root.clone();
        }
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.data_dir().join("store"))
            .unwrap_or_else(|| PathBuf::from("store"))
    }

    /// Build domain inheritance rules from the config file, with an optional
    /// policy override from the command line.
    pub fn inheritance_rules(&self, policy_override: Option<ConflictPolicy>) -> InheritanceRules {
        let mut rules = InheritanceRules {
            never_inherit: self.inheritance.never_inherit.clone(),
            always_inherit: self.inheritance.always_inherit.clone(),
            exclude_from_inheritance: self.inheritance.exclude_from_inheritance.clone(),
            ..Default::default()
        };
        if let Some(policy) = policy_override.or(self.inheritance.policy) {
            rules.policy = policy;
        }
        rules
    }
}
