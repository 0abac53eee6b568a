//! Smoke tests for the `srcdeps` binary.
//!
//! None of these reach a real build: they cover classification, configuration
//! handling and the paths that return before any tool is invoked.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn srcdeps(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("srcdeps").unwrap();
    cmd.current_dir(temp.path())
        .env("NO_COLOR", "1")
        .env_remove("SRCDEPS_YAML_PATH")
        .env_remove("SRCDEPS_SKIP")
        .env_remove("SRCDEPS_FORWARD_PROPERTIES")
        .env_remove("RUST_LOG")
        .env("SRCDEPS_MAVEN_REPO_LOCAL", temp.path().join("m2"))
        .env("SRCDEPS_BUILD_ROOT", temp.path().join("build"));
    cmd
}

#[test]
fn test_classify() {
    let temp = TempDir::new().unwrap();
    srcdeps(&temp)
        .args(["classify", "1.2.3-SRC-branch-main", "1.2.3", "2.0-SRC-revision-3f2a9c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3-SRC-branch-main: source version (base 1.2.3, branch main)"))
        .stdout(predicate::str::contains("1.2.3: not a source version"))
        .stdout(predicate::str::contains("(base 2.0, revision 3f2a9c1)"));
}

#[test]
fn test_plain_versions_need_no_configuration() {
    let temp = TempDir::new().unwrap();
    srcdeps(&temp)
        .args(["build", "org.example:foo:1.2.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org.example:foo:1.2.3 not a source version"))
        .stderr(predicate::str::contains("defaulting to an empty configuration"));
}

#[test]
fn test_unconfigured_source_dependency_fails() {
    let temp = TempDir::new().unwrap();
    srcdeps(&temp)
        .args(["build", "org.example:foo:1.2.3-SRC-branch-main"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No srcdeps repository configured for org.example:foo:1.2.3-SRC-branch-main"))
        .stderr(predicate::str::contains("1 of 1 dependencies are not available"));
}

#[test]
fn test_already_installed_dependency() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("srcdeps.yaml"),
        "repositories:\n  org.example:\n    selectors: [org.example]\n    urls: [\"git:https://github.com/example/foo.git\"]\n",
    )
    .unwrap();
    fs::create_dir_all(temp.path().join("m2/org/example/foo/1.2.3-SRC-branch-main")).unwrap();

    srcdeps(&temp)
        .args(["build", "org.example:foo:1.2.3-SRC-branch-main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already available"));
    assert!(!temp.path().join("build").exists());
}

#[test]
fn test_skip_from_environment() {
    let temp = TempDir::new().unwrap();
    srcdeps(&temp)
        .env("SRCDEPS_SKIP", "true")
        .args(["build", "org.example:foo:1.2.3-SRC-branch-main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn test_explicit_config_and_local_repo() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("ci.yaml");
    fs::write(&config, "skip: false\nrepositories:\n  org.example:\n    selectors: [org.example]\n    urls: [\"git:x\"]\n")
        .unwrap();
    fs::create_dir_all(temp.path().join("other-m2/org/example/foo/1.0-SRC-tag-v1")).unwrap();

    srcdeps(&temp)
        .args(["build", "--config"])
        .arg(&config)
        .arg("--local-repo")
        .arg(temp.path().join("other-m2"))
        .arg("org.example:foo:1.0-SRC-tag-v1")
        .assert()
        .success()
        .stdout(predicate::str::contains("already available"));
}

#[test]
fn test_invalid_configuration_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("srcdeps.yaml"), "repositories: [not, a, map]\n").unwrap();

    srcdeps(&temp)
        .args(["build", "org.example:foo:1.2.3-SRC-branch-main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration unavailable"));
}

#[test]
fn test_invalid_coordinate() {
    let temp = TempDir::new().unwrap();
    srcdeps(&temp)
        .args(["build", "org.example:foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid dependency coordinate"));
}
