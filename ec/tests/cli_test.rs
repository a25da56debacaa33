//! End-to-end tests for the `ec` binary in mock mode

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = "log-level: warn\noutput:\n  sessions-dir: sessions\n";

/// `ec` running inside `dir` with a hermetic config and no API key
fn ec(dir: &Path) -> Command {
    fs::write(dir.join("ec.yml"), CONFIG).expect("write config");
    let mut cmd = Command::cargo_bin("ec").expect("binary built");
    cmd.current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("ENVIRONMENT")
        .args(["-c", "ec.yml"]);
    cmd
}

fn session_dirs(dir: &Path) -> Vec<std::path::PathBuf> {
    match fs::read_dir(dir.join("sessions")) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_demo_runs_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    ec(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("=== WORKFLOW EXTRACTION RESULTS ==="))
        .stdout(predicate::str::contains("Repository: SALES_DW_REPO"))
        .stdout(predicate::str::contains("Transformations: 3"))
        .stdout(predicate::str::contains(
            "Mock workflow summary for SALES_DW_REPO with 3 transformations",
        ));

    assert!(temp_dir.path().join("sample_powercenter.xml").exists());

    let sessions = session_dirs(temp_dir.path());
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].join("workflow_summary.md").exists());
    assert!(sessions[0].join("workflow_diagram.png").exists());
}

#[test]
fn test_analyze_malformed_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("bad.xml"), "<POWERMART><SOURCE NAME=\"S\">").expect("write xml");

    ec(temp_dir.path())
        .args(["analyze", "bad.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("XML parsing failed"));
}

#[test]
fn test_analyze_missing_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    ec(temp_dir.path())
        .args(["analyze", "missing.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read XML file"));
}

#[test]
fn test_generate_writes_sample_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    ec(temp_dir.path())
        .args(["generate", "-o", "export.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export.xml"));

    let xml = fs::read_to_string(temp_dir.path().join("export.xml")).expect("read sample");
    assert!(xml.contains("<POWERMART"));
    assert!(session_dirs(temp_dir.path()).is_empty());
}

#[test]
fn test_sessions_lists_previous_runs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    ec(temp_dir.path())
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions found"));

    ec(temp_dir.path()).arg("run").assert().success();

    ec(temp_dir.path())
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("SESSION"))
        .stdout(predicate::str::contains("yes"));
}
