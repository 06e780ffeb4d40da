//! The helper library registered into every Handlebars registry.
//!
//! Three families:
//!
//! - **Context conditionals**: `if_template`, `if_database`, `if_feature`,
//!   `if_ai`, `if_env` — block helpers reading the generation context, with
//!   `{{else}}` support.
//! - **String transforms**: `kebab_case`, `snake_case`, `camel_case`,
//!   `pascal_case`, `upper_case`, `lower_case`, `capitalize`, `pluralize`.
//! - **Logic**: `and`, `or`, `not`, `eq`, `ne`, `gt`, `lt`, `includes` —
//!   usable as subexpressions inside `{{#if}}`.
//!
//! `switch` and `case` are registered too, but only to fail with a migration
//! message: the old dispatch helpers relied on state shared between calls and
//! were replaced by the per-value conditionals above.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, Renderable, ScopedJson, handlebars_helper,
};
use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde_json::Value;

/// Every helper name the engine registers. The preflight scanner treats
/// anything else invoked as a helper as `missing_helper`.
pub const HELPER_NAMES: &[&str] = &[
    "if_template",
    "if_database",
    "if_feature",
    "if_ai",
    "if_env",
    "kebab_case",
    "snake_case",
    "camel_case",
    "pascal_case",
    "upper_case",
    "lower_case",
    "capitalize",
    "pluralize",
    "and",
    "or",
    "not",
    "eq",
    "ne",
    "gt",
    "lt",
    "includes",
];

/// Names that parse but are rejected at render time.
pub const DEPRECATED_HELPERS: &[&str] = &["switch", "case"];

/// Register the full helper library.
pub fn register_helpers(registry: &mut Handlebars<'_>) {
    registry.register_helper("if_template", Box::new(ContextConditional::Template));
    registry.register_helper("if_database", Box::new(ContextConditional::Database));
    registry.register_helper("if_feature", Box::new(ContextConditional::Feature));
    registry.register_helper("if_ai", Box::new(ContextConditional::Ai));
    registry.register_helper("if_env", Box::new(ContextConditional::Env));

    registry.register_helper("kebab_case", Box::new(kebab_case));
    registry.register_helper("snake_case", Box::new(snake_case));
    registry.register_helper("camel_case", Box::new(camel_case));
    registry.register_helper("pascal_case", Box::new(pascal_case));
    registry.register_helper("upper_case", Box::new(upper_case));
    registry.register_helper("lower_case", Box::new(lower_case));
    registry.register_helper("capitalize", Box::new(capitalize));
    registry.register_helper("pluralize", Box::new(pluralize));

    registry.register_helper("and", Box::new(AndHelper));
    registry.register_helper("or", Box::new(OrHelper));
    registry.register_helper("not", Box::new(not));
    registry.register_helper("eq", Box::new(eq));
    registry.register_helper("ne", Box::new(ne));
    registry.register_helper("gt", Box::new(gt));
    registry.register_helper("lt", Box::new(lt));
    registry.register_helper("includes", Box::new(includes));

    registry.register_helper("switch", Box::new(RemovedHelper("switch")));
    registry.register_helper("case", Box::new(RemovedHelper("case")));
}

// ── Context conditionals ──────────────────────────────────────────────────────

/// Block helpers comparing one context field against the first parameter.
#[derive(Clone, Copy)]
enum ContextConditional {
    Template,
    Database,
    Feature,
    Ai,
    Env,
}

impl ContextConditional {
    fn name(self) -> &'static str {
        match self {
            Self::Template => "if_template",
            Self::Database => "if_database",
            Self::Feature => "if_feature",
            Self::Ai => "if_ai",
            Self::Env => "if_env",
        }
    }

    fn evaluate(self, h: &Helper<'_>, data: &Value) -> Result<bool, RenderError> {
        let field = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or("");

        match self {
            // `if_ai` takes no parameter; it reads the settings block.
            Self::Ai => Ok(data
                .get("ai")
                .and_then(|ai| ai.get("enabled"))
                .and_then(Value::as_bool)
                .unwrap_or(false)),
            Self::Feature => {
                let wanted = required_str_param(h, self.name())?;
                Ok(data
                    .get("features")
                    .and_then(Value::as_array)
                    .is_some_and(|fs| fs.iter().any(|f| f.as_str() == Some(wanted))))
            }
            Self::Template => {
                Ok(field("template").eq_ignore_ascii_case(required_str_param(h, self.name())?))
            }
            Self::Database => {
                Ok(field("database").eq_ignore_ascii_case(required_str_param(h, self.name())?))
            }
            Self::Env => {
                Ok(field("environment").eq_ignore_ascii_case(required_str_param(h, self.name())?))
            }
        }
    }
}

impl HelperDef for ContextConditional {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let matched = self.evaluate(h, ctx.data())?;
        let branch = if matched { h.template() } else { h.inverse() };
        if let Some(template) = branch {
            template.render(r, ctx, rc, out)?;
        }
        Ok(())
    }
}

fn required_str_param<'a>(h: &'a Helper<'_>, name: &'static str) -> Result<&'a str, RenderError> {
    h.param(0)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex(name, 0).into())
}

// ── String transforms ─────────────────────────────────────────────────────────

handlebars_helper!(kebab_case: |s: str| s.to_kebab_case());
handlebars_helper!(snake_case: |s: str| s.to_snake_case());
handlebars_helper!(camel_case: |s: str| s.to_lower_camel_case());
handlebars_helper!(pascal_case: |s: str| s.to_upper_camel_case());
handlebars_helper!(upper_case: |s: str| s.to_uppercase());
handlebars_helper!(lower_case: |s: str| s.to_lowercase());
handlebars_helper!(capitalize: |s: str| capitalize_str(s));
handlebars_helper!(pluralize: |s: str| pluralize_str(s));

fn capitalize_str(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Naive English pluralization, enough for entity names in templates.
fn pluralize_str(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let lower = s.to_lowercase();
    if let Some(stem) = s.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{stem}ies");
        }
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{s}es");
    }
    format!("{s}s")
}

// ── Logic helpers ─────────────────────────────────────────────────────────────

handlebars_helper!(eq: |a: Json, b: Json| a == b);
handlebars_helper!(ne: |a: Json, b: Json| a != b);
handlebars_helper!(gt: |a: f64, b: f64| a > b);
handlebars_helper!(lt: |a: f64, b: f64| a < b);
handlebars_helper!(not: |a: Json| !is_truthy(a));
handlebars_helper!(includes: |arr: Json, item: Json| {
    arr.as_array().is_some_and(|a| a.contains(item))
});

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

/// Variadic `and`; truthy iff every parameter is truthy. Implemented by hand
/// because the macro form is fixed-arity.
struct AndHelper;

impl HelperDef for AndHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = h.params().iter().all(|p| is_truthy(p.value()));
        Ok(ScopedJson::Derived(Value::Bool(value)))
    }
}

/// Variadic `or`; truthy iff any parameter is truthy.
struct OrHelper;

impl HelperDef for OrHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = h.params().iter().any(|p| is_truthy(p.value()));
        Ok(ScopedJson::Derived(Value::Bool(value)))
    }
}

// ── Removed helpers ───────────────────────────────────────────────────────────

/// Always errors with migration guidance. Registered so the old templates
/// fail with a useful message instead of "helper not defined".
struct RemovedHelper(&'static str);

impl HelperDef for RemovedHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        _: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        _: &mut dyn Output,
    ) -> HelperResult {
        Err(RenderErrorReason::Other(format!(
            "the '{}' helper was removed; use per-value conditionals such as \
             if_database or if_feature instead",
            self.0
        ))
        .into())
    }
}
