//! Black-box tests driving the compiled `strata` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn strata() -> Command {
    let mut cmd = Command::cargo_bin("strata").expect("binary builds");
    cmd.env_remove("STRATA_STORE");
    cmd.env("NO_COLOR", "1");
    cmd
}

fn seed(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Minimal but complete store: base tier, one template, one feature.
fn seed_store() -> TempDir {
    let store = TempDir::new().unwrap();
    seed(
        store.path(),
        "base/README.md.hbs",
        "# {{project_name}}\n",
    );
    seed(
        store.path(),
        "templates/blog/src/index.ts.hbs",
        "export const site = '{{project_name_kebab}}';\n",
    );
    seed(
        store.path(),
        "features/docs/docs/index.md.hbs",
        "# Docs for {{project_name}}\n",
    );
    store
}

#[test]
fn help_lists_subcommands() {
    strata()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_matches_cargo() {
    strata()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_emit_shell_script() {
    strata()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

#[test]
fn list_shows_templates_and_features() {
    let store = seed_store();
    strata()
        .args(["list", "--store"])
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("blog"))
        .stdout(predicate::str::contains("docs"));
}

#[test]
fn list_json_is_parseable() {
    let store = seed_store();
    let output = strata()
        .args(["list", "--format", "json", "--store"])
        .arg(store.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["base"], true);
    assert_eq!(parsed["templates"][0]["name"], "blog");
}

#[test]
fn new_generates_a_project() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("my-blog");

    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--features", "docs", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let readme = fs::read_to_string(target.join("README.md")).unwrap();
    assert_eq!(readme, "# my-blog\n");
    let index = fs::read_to_string(target.join("src/index.ts")).unwrap();
    assert_eq!(index, "export const site = 'my-blog';\n");
    assert!(target.join("docs/index.md").exists());
}

#[test]
fn dry_run_lists_files_without_writing() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("my-blog");

    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--dry-run"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("README.md"))
        .stdout(predicate::str::contains("No files were written"));

    assert!(!target.exists());
}

#[test]
fn json_output_reports_generated_files() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("my-blog");

    let output = strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--yes", "--output-format", "json"])
        .args(["--store"])
        .arg(store.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let generated = report["generated"].as_array().unwrap();
    assert!(generated.iter().any(|f| f == "README.md"));
    assert!(report["metrics"]["files_processed"].as_u64().unwrap() >= 2);
}

#[test]
fn force_replaces_an_existing_directory() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("my-blog");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("stale.txt"), "old").unwrap();

    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--yes", "--force"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .success();

    assert!(!target.join("stale.txt").exists());
    assert!(target.join("README.md").exists());
}
