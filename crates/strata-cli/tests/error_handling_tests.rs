//! Exit code and error message contract for the `strata` binary.
//!
//! | Code | Meaning                 |
//! |------|-------------------------|
//! |  1   | Internal / system error |
//! |  2   | User / input error      |
//! |  3   | Resource not found      |
//! |  4   | Configuration error     |

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

fn seed_store() -> TempDir {
    let store = TempDir::new().unwrap();
    seed(store.path(), "base/README.md.hbs", "# {{project_name}}\n");
    seed(
        store.path(),
        "templates/blog/src/index.ts.hbs",
        "export const site = '{{project_name_kebab}}';\n",
    );
    store
}

#[test]
fn missing_required_args_exit_2() {
    strata().arg("new").assert().failure().code(2);
}

#[test]
fn conflicting_quiet_and_verbose_exit_2() {
    strata()
        .args(["--quiet", "--verbose", "list"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn unknown_template_exits_3_and_names_it() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();

    strata()
        .args(["new"])
        .arg(workdir.path().join("app"))
        .args(["--template", "no-such-template", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("no-such-template"))
        .stderr(predicate::str::contains("strata list"));
}

#[test]
fn missing_store_exits_3() {
    let workdir = TempDir::new().unwrap();

    strata()
        .args(["new"])
        .arg(workdir.path().join("app"))
        .args(["--template", "blog", "--yes"])
        .args(["--store", "/definitely/not/a/store"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Template store not found"));
}

#[test]
fn existing_target_exits_2_with_force_hint() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("app");
    fs::create_dir_all(&target).unwrap();

    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn invalid_project_name_exits_2() {
    let store = seed_store();

    strata()
        .args(["new", ".hidden", "--template", "blog", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid project name"));
}

#[test]
fn unknown_feature_exits_2_and_lists_known() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();

    strata()
        .args(["new"])
        .arg(workdir.path().join("app"))
        .args(["--template", "blog", "--features", "blockchain", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("blockchain"));
}

#[test]
fn missing_config_file_exits_4() {
    strata()
        .args(["--config", "/no/such/config.toml", "list"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn version_conflict_in_store_exits_2_without_writing() {
    let store = seed_store();
    let workdir = TempDir::new().unwrap();
    let target = workdir.path().join("app");

    seed(
        store.path(),
        "base/package.json.hbs",
        r#"{ "name": "x", "dependencies": { "react": "^18.0.0" } }"#,
    );
    seed(
        store.path(),
        "templates/blog/package.json.hbs",
        r#"{ "name": "x", "dependencies": { "react": "^19.0.0" } }"#,
    );

    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--yes"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("react"));

    assert!(!target.exists());

    // The same run succeeds once overrides are allowed.
    strata()
        .args(["new"])
        .arg(&target)
        .args(["--template", "blog", "--yes", "--allow-overrides"])
        .args(["--store"])
        .arg(store.path())
        .assert()
        .success();

    let manifest = fs::read_to_string(target.join("package.json")).unwrap();
    assert!(manifest.contains("^19.0.0"));
}
