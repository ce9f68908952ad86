//! Exit status and output of the command-line tools

use std::fs;
use std::process::Command;
use tempfile::TempDir;

const FIX_BIN: &str = env!("CARGO_BIN_EXE_fix-duplicate-toml-sections");
const MERGE_BIN: &str = env!("CARGO_BIN_EXE_merge-pyproject-toml");

#[test]
fn test_fix_missing_file_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(FIX_BIN)
        .arg(dir.path().join("pyproject.toml"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_fix_reports_no_duplicates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pyproject.toml");
    fs::write(&path, "[tool.pytest.ini_options]\ntestpaths = [\"tests\"]\n").unwrap();

    let output = Command::new(FIX_BIN).arg(&path).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No duplicate [tool.pytest.ini_options] sections found"));
}

#[test]
fn test_fix_json_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pyproject.toml");
    fs::write(
        &path,
        "[tool.pytest.ini_options]\na = [\"x\"]\n\n[tool.pytest.ini_options]\na = [\"y\"]\n",
    )
    .unwrap();

    let output = Command::new(FIX_BIN)
        .arg(&path)
        .arg("--no-backup")
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fixed"], true);
    assert_eq!(report["sections_found"], 2);
    assert!(report.get("backup").is_none());
}

#[test]
fn test_merge_overwrite_flag() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("pyproject.toml");
    let template = dir.path().join("template.toml");
    fs::write(&existing, "[project]\nname = \"demo\"\n\n[tool.mypy]\nstrict = false\n").unwrap();
    fs::write(&template, "[tool.mypy]\nstrict = true\n").unwrap();

    let output = Command::new(MERGE_BIN)
        .arg(&existing)
        .arg(&template)
        .arg("--overwrite-tools")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Replaced tool configurations"));

    let merged: toml::Table = toml::from_str(&fs::read_to_string(&existing).unwrap()).unwrap();
    assert_eq!(merged["tool"]["mypy"]["strict"].as_bool(), Some(true));
}

#[test]
fn test_merge_invalid_toml_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("pyproject.toml");
    let template = dir.path().join("template.toml");
    fs::write(&existing, "[project\n").unwrap();
    fs::write(&template, "[tool.mypy]\nstrict = true\n").unwrap();

    let output = Command::new(MERGE_BIN)
        .arg(&existing)
        .arg(&template)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error merging pyproject.toml"));
}
