//! Conflict policies and inheritance rules.
//!
//! When the same relative path appears in more than one tier the resolver
//! consults these rules, in order:
//!
//! 1. never-inherit patterns (base entries dropped unconditionally)
//! 2. always-inherit patterns (base wins unless an overlay also exists)
//! 3. exclude-from-inheritance patterns (manifest paths handed to the
//!    dependency merger instead of file-level resolution)
//! 4. the configured [`ConflictPolicy`]

use serde::{Deserialize, Serialize};

/// How same-path conflicts between tiers are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Highest-priority tier wins (feature > template > base).
    #[default]
    TemplateWins,
    /// Base wins even against overlays.
    BaseWins,
    /// Any conflict is fatal; the error names every contending source.
    Error,
    /// Falls back to highest-priority-wins and records a warning. Structural
    /// merging only exists for package manifests, which go through the
    /// dependency merger instead.
    Merge,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemplateWins => "template-wins",
            Self::BaseWins => "base-wins",
            Self::Error => "error",
            Self::Merge => "merge",
        }
    }
}

/// Pattern lists controlling which paths escape normal tier resolution.
///
/// Patterns are anchored against the whole forward-slash `relative_path`:
/// `*` matches zero or more characters including `/`, `?` matches exactly
/// one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InheritanceRules {
    /// Base entries for matching paths are dropped before resolution. A path
    /// that exists only in base therefore produces no output file at all.
    pub never_inherit: Vec<String>,

    /// Base wins for matching paths unless a template or feature tier also
    /// provides the file.
    pub always_inherit: Vec<String>,

    /// Matching paths are removed from file-level resolution entirely; the
    /// dependency merger owns them.
    pub exclude_from_inheritance: Vec<String>,

    pub policy: ConflictPolicy,
}

impl InheritanceRules {
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn matches_never_inherit(&self, relative_path: &str) -> bool {
        self.never_inherit
            .iter()
            .any(|p| pattern_matches(p, relative_path))
    }

    pub fn matches_always_inherit(&self, relative_path: &str) -> bool {
        self.always_inherit
            .iter()
            .any(|p| pattern_matches(p, relative_path))
    }

    pub fn matches_excluded(&self, relative_path: &str) -> bool {
        self.exclude_from_inheritance
            .iter()
            .any(|p| pattern_matches(p, relative_path))
    }
}

/// Anchored wildcard match.
///
/// `*` matches any run of characters, `/` included; `?` matches exactly one
/// character. Everything else is literal. Classic two-pointer scan with
/// star backtracking, linear in practice.
pub fn pattern_matches(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }

    pi == p.len()
}
