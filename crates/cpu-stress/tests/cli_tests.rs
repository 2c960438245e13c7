//! CLI integration tests

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn cpu_stress() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cpu-stress"))
}

/// Non-numeric duration prints usage and exits 1 without starting workers
#[test]
fn test_invalid_duration_prints_usage() {
    let output = cpu_stress()
        .arg("abc")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Usage:"), "Should print usage");
    assert!(stderr.contains("[duration_in_seconds]"));
    assert!(!stdout.contains("Starting chaos demo"), "No workers launched");
}

#[test]
fn test_negative_duration_rejected() {
    let output = cpu_stress()
        .arg("-5")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_zero_duration_completes() {
    let output = cpu_stress()
        .arg("0")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Starting chaos demo on"));
    assert!(stdout.contains("Duration: 0 seconds"));
    assert!(stdout.contains("Chaos finished"));
}

/// Completion is not reported before the deadline
#[test]
fn test_runs_for_requested_duration() {
    let start = Instant::now();
    let output = cpu_stress()
        .arg("1")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[test]
fn test_cli_help() {
    let output = cpu_stress()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("duration_in_seconds"));
}

/// A duration past what the clock can represent runs until killed
#[test]
fn test_huge_duration_keeps_running() {
    let mut child = cpu_stress()
        .arg(u64::MAX.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to execute command");

    std::thread::sleep(Duration::from_millis(500));
    let still_running = child.try_wait().expect("Failed to poll child").is_none();

    child.kill().expect("Failed to kill child");
    child.wait().expect("Failed to reap child");
    assert!(still_running, "Workers should not panic on an unbounded deadline");
}
