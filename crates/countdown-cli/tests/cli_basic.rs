//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_countdown"))
        .env("COUNTDOWN_HOME", home)
        .env_remove("COUNTDOWN_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run a CLI command with `input` written to its stdin, then stdin closed.
fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_countdown"))
        .env("COUNTDOWN_HOME", home)
        .env_remove("COUNTDOWN_LOG")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("Failed to wait for CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Home with a quiet, instantly-finishing completion alert.
fn quiet_home() -> TempDir {
    let home = TempDir::new().unwrap();
    for (key, value) in [
        ("notifications.indicator_secs", "0"),
        ("notifications.vibration", "false"),
    ] {
        let (_, stderr, code) = run_cli(home.path(), &["config", "set", key, value]);
        assert_eq!(code, 0, "config set {key} failed: {stderr}");
    }
    home
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// The `type` of every event line, in order.
fn event_types(lines: &[serde_json::Value]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| l["type"].as_str().map(str::to_string))
        .collect()
}

/// The frame printed right after the first event of type `kind`.
fn frame_after<'a>(lines: &'a [serde_json::Value], kind: &str) -> &'a serde_json::Value {
    let at = lines.iter().position(|l| l["type"] == kind).unwrap();
    &lines[at + 1]
}

#[test]
fn test_config_get_default() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "refresh.frame_interval_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "16");
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "history.enabled", "false"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "history.enabled"]);
    assert_eq!(stdout.trim(), "false");
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "refresh.bogus", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_history_empty() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["history"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no recent countdowns"));

    let (stdout, _, code) = run_cli(home.path(), &["history", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_shortcuts_default_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["shortcuts", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let minutes: Vec<u64> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["minutes"].as_u64().unwrap())
        .collect();
    assert_eq!(minutes, vec![1, 5, 10]);
}

#[test]
fn test_run_without_duration_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no duration"));
}

#[test]
fn test_run_zero_duration_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["run", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("zero"));
}

#[test]
fn test_run_json_completes_and_records_history() {
    let home = quiet_home();
    let (stdout, stderr, code) = run_cli(home.path(), &["run", "1", "--json"]);
    assert_eq!(code, 0, "run failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(lines.first().unwrap()["type"], "TimerStarted");
    assert_eq!(lines.first().unwrap()["total_ms"], 1000);
    assert!(lines
        .iter()
        .any(|l| l["type"] == "TimerCompleted" && l["total_ms"] == 1000));
    assert!(lines
        .iter()
        .any(|l| l["is_complete"] == true && l["percentage"] == 100 && l["display"] == "0.0"));
    assert_eq!(lines.last().unwrap()["type"], "TimerCleared");

    let (stdout, _, _) = run_cli(home.path(), &["history", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["seconds"], 1);
    assert_eq!(parsed[0]["duration"], "1s");
}

#[test]
fn test_run_last_repeats_previous() {
    let home = quiet_home();
    let (_, _, code) = run_cli(home.path(), &["run", "--seconds", "1", "--json"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["run", "--last", "--json"]);
    assert_eq!(code, 0);
    assert_eq!(json_lines(&stdout)[0]["total_ms"], 1000);
}

#[test]
fn test_history_clear() {
    let home = quiet_home();
    run_cli(home.path(), &["run", "1", "--json"]);
    let (stdout, _, code) = run_cli(home.path(), &["history", "clear"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("history cleared"));

    let (_, stderr, code) = run_cli(home.path(), &["run", "--last"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no recent countdown"));
}

#[test]
fn test_run_quit_from_stdin() {
    let home = quiet_home();
    let (stdout, stderr, code) =
        run_cli_with_input(home.path(), &["run", "10m", "--json"], "q\n");
    assert_eq!(code, 0, "run failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(event_types(&lines), vec!["TimerStarted", "TimerCleared"]);
}

#[test]
fn test_run_pause_from_stdin() {
    let home = quiet_home();
    let (stdout, stderr, code) =
        run_cli_with_input(home.path(), &["run", "10m", "--json"], "p\nq\n");
    assert_eq!(code, 0, "run failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(
        event_types(&lines),
        vec!["TimerStarted", "TimerPaused", "TimerCleared"]
    );
    let paused = frame_after(&lines, "TimerPaused");
    assert_eq!(paused["is_running"], false);
    assert_eq!(paused["is_complete"], false);
}

#[test]
fn test_run_empty_line_toggles_pause() {
    let home = quiet_home();
    let (stdout, _, code) =
        run_cli_with_input(home.path(), &["run", "10m", "--json"], "\n\nq\n");
    assert_eq!(code, 0);

    let lines = json_lines(&stdout);
    assert_eq!(
        event_types(&lines),
        vec!["TimerStarted", "TimerPaused", "TimerResumed", "TimerCleared"]
    );
    assert_eq!(frame_after(&lines, "TimerResumed")["is_running"], true);
}

#[test]
fn test_run_reset_from_stdin() {
    let home = quiet_home();
    let (stdout, stderr, code) =
        run_cli_with_input(home.path(), &["run", "10m", "--json"], "r\nq\n");
    assert_eq!(code, 0, "run failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(
        event_types(&lines),
        vec!["TimerStarted", "TimerReset", "TimerCleared"]
    );
    let reset = frame_after(&lines, "TimerReset");
    assert_eq!(reset["clock"], "10:00");
    assert_eq!(reset["percentage"], 0);
    assert_eq!(reset["is_running"], false);
}
