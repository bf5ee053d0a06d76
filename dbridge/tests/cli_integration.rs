//! CLI Integration Tests
//!
//! Exercises the dbridge binary end to end for the fast failure paths that
//! need no Node.js runtime installed.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Helper to run dbridge with arguments
fn run_dbridge(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbridge"))
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to run dbridge")
}

#[test]
fn version_flag_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = run_dbridge(&["--version"], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dbridge"), "unexpected stdout: {stdout}");
}

#[test]
fn help_flag_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = run_dbridge(&["--help"], dir.path());
    assert!(output.status.success());
}

#[test]
fn missing_target_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = run_dbridge(&[], dir.path());
    assert!(!output.status.success());
}

#[test]
fn unresolvable_target_reports_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    // Port 0 skips the port-free wait, so resolution fails immediately.
    let output = run_dbridge(&["-p", "0", "definitely-not-a-real-command-xyz"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("definitely-not-a-real-command-xyz"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn host_port_form_without_script_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = run_dbridge(&["127.0.0.1:9229"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no script follows"),
        "unexpected stderr: {stderr}"
    );
}

#[cfg(unix)]
#[test]
fn target_that_exits_without_announcing_fails_fast() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("quits.js");
    std::fs::write(&script, "exit 0\n").unwrap();

    let output = run_dbridge(
        &["-p", "0", "--runtime", "sh", script.to_string_lossy().as_ref()],
        dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("exited before the inspector"),
        "unexpected stderr: {stderr}"
    );
}
