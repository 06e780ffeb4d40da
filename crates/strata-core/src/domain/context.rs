//! The canonical, fully-typed generation context.
//!
//! One struct drives the whole pipeline: tier resolution, helper evaluation
//! during rendering, and the per-file inclusion predicates in the writer.
//! There is deliberately no "could be the config or could be the root"
//! fallback chain — callers build exactly this shape at the boundary and the
//! core treats it as immutable input.
//!
//! ## Derived variables
//!
//! The project name is transformed into casing variants once at construction
//! so templates can use `{{project_name_kebab}}` etc. without re-deriving per
//! file:
//!
//! | Field | Example |
//! |-------|---------|
//! | `project_name` | "My Awesome App" |
//! | `project_name_snake` | "my_awesome_app" |
//! | `project_name_kebab` | "my-awesome-app" |
//! | `project_name_camel` | "myAwesomeApp" |
//! | `project_name_pascal` | "MyAwesomeApp" |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Feature identifiers the engine recognizes.
///
/// Unknown features are rejected at context validation, not silently ignored
/// halfway through resolution.
pub const KNOWN_FEATURES: &[&str] = &["ai", "auth", "payments", "realtime", "docs"];

/// Database selection driving `if_database` helpers and manifest stand-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    MongoDb,
    #[default]
    PostgreSql,
    SqLite,
    None,
}

impl Database {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MongoDb => "mongodb",
            Self::PostgreSql => "postgresql",
            Self::SqLite => "sqlite",
            Self::None => "none",
        }
    }

    /// Parse a user-supplied database name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::SqLite),
            "none" => Ok(Self::None),
            _ => Err(DomainError::InvalidContext(format!(
                "unknown database '{s}'; expected one of: mongodb, postgresql, sqlite, none"
            ))),
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target environment for the generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(DomainError::InvalidContext(format!(
                "unknown environment '{s}'; expected one of: development, staging, production"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI/plugin configuration block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AiSettings {
    /// Master switch; when false the `/ai/` subtree is skipped entirely.
    pub enabled: bool,
    /// Provider name, e.g. "openai", "ollama", "huggingface".
    pub provider: Option<String>,
    /// Default model identifier passed through to generated config files.
    pub model: Option<String>,
}

/// Boolean project toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub typescript: bool,
    pub docker: bool,
    pub testing: bool,
    pub git: bool,
    pub install: bool,
    /// Backend-only project; frontend trees are skipped at write time.
    pub api_only: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            typescript: true,
            docker: false,
            testing: true,
            git: true,
            install: false,
            api_only: false,
        }
    }
}

/// Full configuration driving resolution and rendering.
///
/// Owned by the caller and treated as immutable by the core. Serialized as
/// one flat JSON object — that serialization *is* the render data the
/// template helpers see, so field names here are part of the template
/// contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Original project name as provided by the user.
    pub project_name: String,
    pub project_name_snake: String,
    pub project_name_kebab: String,
    pub project_name_camel: String,
    pub project_name_pascal: String,

    /// Named template tier to resolve (must exist in the store).
    pub template: String,

    /// Enabled features, unique, in user-given order. Order does not affect
    /// resolution semantics but does decide which overlay wins same-path
    /// conflicts between two features (last discovered wins).
    pub features: Vec<String>,

    pub database: Database,
    pub environment: Environment,

    #[serde(flatten)]
    pub toggles: Toggles,

    pub ai: AiSettings,
}

impl ProjectContext {
    /// Build a context with derived name variants and defaults everywhere
    /// else.
    pub fn new(project_name: impl Into<String>, template: impl Into<String>) -> Self {
        let project_name = project_name.into();
        Self {
            project_name_snake: to_snake_case(&project_name),
            project_name_kebab: to_kebab_case(&project_name),
            project_name_camel: to_camel_case(&project_name),
            project_name_pascal: to_pascal_case(&project_name),
            project_name,
            template: template.into(),
            features: Vec::new(),
            database: Database::default(),
            environment: Environment::default(),
            toggles: Toggles::default(),
            ai: AiSettings::default(),
        }
    }

    /// Fluent feature addition; duplicates are dropped.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        let feature = feature.into();
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = database;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_ai(mut self, ai: AiSettings) -> Self {
        self.ai = ai;
        self
    }

    /// Check whether a feature is enabled.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Validate invariants: non-empty name/template, recognized features,
    /// no duplicate features.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.project_name.is_empty() {
            return Err(DomainError::InvalidContext(
                "project name cannot be empty".into(),
            ));
        }
        if self.template.is_empty() {
            return Err(DomainError::InvalidContext(
                "template name cannot be empty".into(),
            ));
        }
        for feature in &self.features {
            if !KNOWN_FEATURES.contains(&feature.as_str()) {
                return Err(DomainError::UnknownFeature {
                    feature: feature.clone(),
                    known: KNOWN_FEATURES.join(", "),
                });
            }
        }
        let mut seen = std::collections::HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(DomainError::InvalidContext(format!(
                    "duplicate feature '{feature}'"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// String Case Conversion
// ============================================================================

fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize_word(w)).collect()
}

fn to_camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(w);
        } else {
            out.push_str(&capitalize_word(w));
        }
    }
    out
}

fn capitalize_word(w: &str) -> String {
    let mut chars = w.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::new();
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Split an identifier on separators, camelCase transitions, and acronym
/// boundaries (`HTTPServer` → `http` + `server`). Output words are lowercase.
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(next) = chars.peek() {
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
