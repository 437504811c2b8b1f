//! Integration tests for the loopkeeper CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the loopkeeper binary
fn loopkeeper() -> Command {
    Command::new(cargo::cargo_bin!("loopkeeper"))
}

fn write_tasks(dir: &TempDir, content: &str) {
    std::fs::write(dir.path().join("TASKS.md"), content).unwrap();
}

#[test]
fn test_help() {
    loopkeeper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("decide"))
        .stdout(predicate::str::contains("gate-stop"))
        .stdout(predicate::str::contains("brief"));
}

#[test]
fn test_version() {
    loopkeeper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_missing_project_dir_fails() {
    loopkeeper()
        .args(["--project", "/nonexistent/path/zzz", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_decide_on_empty_directory_allows() {
    let temp = TempDir::new().unwrap();
    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "decide"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\": \"allow\""))
        .stdout(predicate::str::contains("\"phase\": \"uninitialized\""))
        .stdout(predicate::str::contains("no tasks defined"));
}

#[test]
fn test_sync_reports_progress() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [x] TASK-001: done\n- [>] TASK-002: current\n- [ ] TASK-003: later\n");

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/3"))
        .stdout(predicate::str::contains("TASK-002"));

    assert!(temp.path().join(".loopkeeper/state.json").exists());
    assert!(temp.path().join(".loopkeeper/decisions.log").exists());
}

#[test]
fn test_sync_without_task_list_is_noop() {
    let temp = TempDir::new().unwrap();
    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no task list"));
    assert!(!temp.path().join(".loopkeeper/state.json").exists());
}

#[test]
fn test_gate_stop_blocks_while_work_remains() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [ ] TASK-001: one\n- [ ] TASK-002: two\n");

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "sync"])
        .assert()
        .success();

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "gate-stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\": \"block\""))
        .stdout(predicate::str::contains("2 tasks remaining"));
}

#[test]
fn test_gate_stop_allows_when_all_completed() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [x] TASK-001: one\n- [X] TASK-002: two\n");

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "sync"])
        .assert()
        .success();

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "gate-stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\": \"allow\""))
        .stdout(predicate::str::contains("all tasks completed"));
}

#[test]
fn test_record_error_without_task_or_state_fails() {
    let temp = TempDir::new().unwrap();
    loopkeeper()
        .args([
            "--project",
            temp.path().to_str().unwrap(),
            "record-error",
            "compile failed",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active task"));
}

#[test]
fn test_record_and_resolve_error() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [>] TASK-001: current\n");

    let project = temp.path().to_str().unwrap();
    loopkeeper().args(["--project", project, "sync"]).assert().success();

    loopkeeper()
        .args(["--project", project, "record-error", "tests failed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TASK-001"))
        .stdout(predicate::str::contains("retries 1/5"));

    loopkeeper()
        .args(["--project", project, "resolve-error", "fixed assertion"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved:"));

    // Second resolve finds nothing and succeeds anyway.
    loopkeeper()
        .args(["--project", project, "resolve-error", "again"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no unresolved error"));
}

#[test]
fn test_brief_full_to_stdout() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [>] TASK-001: build the parser\n");
    std::fs::write(temp.path().join("CONTRACT.md"), "# Rules\nAlways run tests.\n").unwrap();

    let project = temp.path().to_str().unwrap();
    loopkeeper().args(["--project", project, "sync"]).assert().success();

    loopkeeper()
        .args(["--project", project, "brief", "full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# LOOPKEEPER BRIEFING"))
        .stdout(predicate::str::contains("## Task list"))
        .stdout(predicate::str::contains("## Contract"))
        .stdout(predicate::str::contains("Always run tests."));
}

#[test]
fn test_brief_to_file() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [ ] TASK-001: start\n");

    let project = temp.path().to_str().unwrap();
    let out = temp.path().join("briefing.md");
    loopkeeper()
        .args(["--project", project, "brief", "task", "--output", out.to_str().unwrap()])
        .assert()
        .success();

    let document = std::fs::read_to_string(&out).unwrap();
    assert!(document.contains("# LOOPKEEPER BRIEFING"));
}

#[test]
fn test_status_shows_phase() {
    let temp = TempDir::new().unwrap();
    write_tasks(&temp, "- [>] TASK-001: current\n- [ ] TASK-002: later\n");

    let project = temp.path().to_str().unwrap();
    loopkeeper().args(["--project", project, "sync"]).assert().success();

    loopkeeper()
        .args(["--project", project, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACTIVE"))
        .stdout(predicate::str::contains("0/2"))
        .stdout(predicate::str::contains("TASK-001"));
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(".loopkeeper")).unwrap();
    std::fs::write(temp.path().join(".loopkeeper/config.toml"), "not [ valid toml").unwrap();

    loopkeeper()
        .args(["--project", temp.path().to_str().unwrap(), "status"])
        .assert()
        .failure()
        .code(7);
}
