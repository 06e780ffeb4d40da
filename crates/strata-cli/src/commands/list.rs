//! Implementation of the `strata list` command.
//!
//! Reads the store layout directly; no resolution or rendering happens here.

use std::path::Path;

use serde_json::json;
use walkdir::WalkDir;

use crate::{
    cli::{ListArgs, ListFormat, global::GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

use strata_core::application::services::{BASE_DIR, FEATURES_DIR, TEMPLATES_DIR};

pub fn execute(
    args: ListArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let store = config.store_root(args.store.as_ref());
    if !store.is_dir() {
        return Err(CliError::StoreNotFound { path: store });
    }

    let has_base = store.join(BASE_DIR).is_dir();
    let templates = subdirectories(&store.join(TEMPLATES_DIR))?;
    let features = subdirectories(&store.join(FEATURES_DIR))?;

    match args.format {
        ListFormat::Table => {
            output.header("Templates:")?;
            if templates.is_empty() {
                output.print("  (none)")?;
            }
            for (name, files) in &templates {
                output.print(&format!("  {name}  ({files} files)"))?;
            }
            output.print("")?;
            output.header("Features:")?;
            if features.is_empty() {
                output.print("  (none)")?;
            }
            for (name, files) in &features {
                output.print(&format!("  {name}  ({files} files)"))?;
            }
            output.print("")?;
            if has_base {
                output.info("Base tier present: shared files are inherited by every template.")?;
            } else {
                output.warning("No base/ directory; templates stand alone.")?;
            }
        }
        ListFormat::List => {
            for (name, _) in &templates {
                println!("{name}");
            }
        }
        ListFormat::Json => {
            // JSON goes straight to stdout so it stays parseable in pipes.
            let payload = json!({
                "store": store.display().to_string(),
                "base": has_base,
                "templates": templates.iter().map(|(n, f)| json!({"name": n, "files": f})).collect::<Vec<_>>(),
                "features": features.iter().map(|(n, f)| json!({"name": n, "files": f})).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".into()));
        }
    }

    Ok(())
}

/// Immediate subdirectories of `root` with their file counts, sorted by name.
/// A missing `root` is an empty list, not an error.
fn subdirectories(root: &Path) -> CliResult<Vec<(String, usize)>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let files = WalkDir::new(entry.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        out.push((name, files));
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(subdirectories(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn counts_files_recursively_per_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("saas/src")).unwrap();
        fs::write(dir.path().join("saas/a.txt"), "x").unwrap();
        fs::write(dir.path().join("saas/src/b.txt"), "x").unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();

        let dirs = subdirectories(dir.path()).unwrap();
        assert_eq!(dirs, vec![("blog".into(), 0), ("saas".into(), 2)]);
    }
}
