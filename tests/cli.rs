use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

use workshop::storage::ProgressStore;

/// Binary isolated from the host's config and environment.
fn workshop_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("workshop").unwrap();
    cmd.env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join(".config"))
        .env_remove("WORKSHOP_CONFIG")
        .env_remove("WORKSHOP_CHALLENGES_DIR")
        .env_remove("WORKSHOP_CHALLENGES_PATTERN")
        .env_remove("RUST_LOG")
        .arg("--cwd")
        .arg(root);
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("workshop").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("workshop").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_empty_workshop_says_bye() {
    let dir = tempdir().unwrap();
    workshop_cmd(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No more challenges in this workshop, bye.",
        ))
        .stdout(predicate::str::contains("delete .workshop directory"));
    assert!(dir.path().join(".workshop").is_dir());
}

#[test]
fn test_all_passed_says_bye_without_terminal() {
    let dir = tempdir().unwrap();
    write(dir.path(), "basics/q.yaml", "message: One plus one?\ntype: input\nanswer: \"2\"\n");
    let store = ProgressStore::open(dir.path()).unwrap();
    store.mark_passed("basics").unwrap();
    store.close().unwrap();

    workshop_cmd(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("No more challenges"));
}

#[test]
fn test_run_robot_empty_outcome() {
    let dir = tempdir().unwrap();
    let output = workshop_cmd(dir.path())
        .args(["--robot", "run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "empty");
}

#[test]
fn test_run_pending_requires_terminal() {
    let dir = tempdir().unwrap();
    write(dir.path(), "basics/q.yaml", "message: One plus one?\ntype: input\nanswer: \"2\"\n");

    workshop_cmd(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("interactive terminal"));
}

#[test]
fn test_locked_store_fails_to_boot() {
    let dir = tempdir().unwrap();
    let _held = ProgressStore::open(dir.path()).unwrap();

    workshop_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to boot workshop."));
}

#[test]
fn test_list_robot_reports_status_and_issues() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "lessons/intro/q.yaml",
        "- message: First?\n  type: input\n  answer: a\n- message: Second?\n  type: list\n  choices: [x, y]\n  answer: 2\n",
    );
    write(dir.path(), "lessons/broken/q.yaml", "message: [unclosed\n");

    let store = ProgressStore::open(dir.path()).unwrap();
    store.mark_passed("lessons-intro-1").unwrap();
    store.close().unwrap();

    let output = workshop_cmd(dir.path())
        .args(["--robot", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["count"], 2);
    let questions = json["questions"].as_array().unwrap();
    assert_eq!(questions[0]["identity"], "lessons-intro-1");
    assert_eq!(questions[0]["status"], "passed");
    assert_eq!(questions[1]["identity"], "lessons-intro-2");
    assert_eq!(questions[1]["status"], "pending");
    assert_eq!(questions[1]["type"], "list");
    assert_eq!(json["issues"].as_array().unwrap().len(), 1);
}

#[test]
fn test_list_pending_filters_passed() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "intro/q.yaml",
        "- message: First?\n  type: input\n  answer: a\n- message: Second?\n  type: input\n  answer: b\n",
    );
    let store = ProgressStore::open(dir.path()).unwrap();
    store.mark_passed("intro-1").unwrap();
    store.close().unwrap();

    let output = workshop_cmd(dir.path())
        .args(["--robot", "list", "--pending"])
        .output()
        .unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["questions"][0]["identity"], "intro-2");
}

#[test]
fn test_list_human_output() {
    let dir = tempdir().unwrap();
    write(dir.path(), "intro/q.yaml", "message: First?\ntype: confirm\nanswer: true\n");

    workshop_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("intro"))
        .stdout(predicate::str::contains("pending"));
}

#[test]
fn test_project_config_sets_challenges_dir() {
    let dir = tempdir().unwrap();
    write(dir.path(), "workshop.toml", "[challenges]\ndir = \"course\"\n");
    write(dir.path(), "course/a/q.yaml", "message: A?\ntype: input\nanswer: a\n");
    write(dir.path(), "other/q.yaml", "message: B?\ntype: input\nanswer: b\n");

    let output = workshop_cmd(dir.path())
        .args(["--robot", "list"])
        .output()
        .unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["questions"][0]["identity"], "course-a");
}

#[test]
fn test_robot_error_is_json() {
    let dir = tempdir().unwrap();
    let output = workshop_cmd(dir.path())
        .args(["--robot", "--config", "missing.toml", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"], true);
}
