//! CLI end-to-end tests
//!
//! Tests for the sessionwatch command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the sessionwatch binary
#[allow(deprecated)]
fn sessionwatch_cmd() -> Command {
    Command::cargo_bin("sessionwatch").unwrap()
}

const IDLE_TIMEOUT_LOG: &str = r#"{"timestamp":"2024-05-01T10:00:00Z","type":"play_requested"}
{"timestamp":"2024-05-01T10:00:02Z","type":"is_playing_changed","is_playing":true}
{"timestamp":"2024-05-01T10:00:02Z","type":"first_frame_rendered"}
{"timestamp":"2024-05-01T10:01:00Z","type":"is_playing_changed","is_playing":false}
{"timestamp":"2024-05-01T10:01:05Z","type":"app_backgrounded"}
{"timestamp":"2024-05-01T10:03:05Z","type":"background_idle_timeout"}
"#;

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = sessionwatch_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = sessionwatch_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessionwatch"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = sessionwatch_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessionwatch"));
}

#[test]
fn test_cli_replay_help() {
    let mut cmd = sessionwatch_cmd();
    cmd.args(["replay", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replay a recorded event log"));
}

#[test]
fn test_cli_replay_missing_file() {
    let mut cmd = sessionwatch_cmd();
    cmd.args(["replay", "/nonexistent/events.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_replay_text_report() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("events.jsonl");
    fs::write(&log, IDLE_TIMEOUT_LOG).unwrap();

    let mut cmd = sessionwatch_cmd();
    cmd.arg("replay")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("ATTACHED -> PLAYING"))
        .stdout(predicate::str::contains("BACKGROUND -> ENDED"))
        .stdout(predicate::str::contains("End reason: BACKGROUND_IDLE_TIMEOUT"))
        .stdout(predicate::str::contains("Discard: no"));
}

#[test]
fn test_cli_replay_json_report() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("events.json");
    fs::write(
        &log,
        r#"[{"timestamp":"2024-05-01T10:00:00Z","type":"player_released"}]"#,
    )
    .unwrap();

    let output = sessionwatch_cmd()
        .args(["replay", "--json"])
        .arg(&log)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["report"]["endReason"], "PLAYER_RELEASED");
    assert_eq!(report["report"]["discard"], true);
    assert_eq!(report["report"]["summary"]["schemaVersion"], "1.0");
}

#[test]
fn test_cli_replay_invalid_json() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("events.jsonl");
    fs::write(&log, "{\"type\":\"play_requested\"}\n").unwrap();

    let mut cmd = sessionwatch_cmd();
    cmd.arg("replay")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_cli_validate_default_config() {
    let mut cmd = sessionwatch_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_cli_validate_config_with_warnings() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"session":{"background_idle_timeout_ms":0}}"#).unwrap();

    let mut cmd = sessionwatch_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"))
        .stdout(predicate::str::contains("background_idle_timeout_ms is 0"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "not json").unwrap();

    let mut cmd = sessionwatch_cmd();
    cmd.arg("validate").arg(&config).assert().failure();
}

#[test]
fn test_cli_verbose_flag_accepted() {
    let mut cmd = sessionwatch_cmd();
    cmd.args(["--verbose", "validate"]).assert().success();
}
