//! CLI tests for the `pacal inspect` subcommand.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn pacal_cmd() -> Command {
    Command::new(cargo::cargo_bin!("pacal"))
}

fn fixture_path() -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/mk3.gcode")
        .to_string_lossy()
        .to_string()
}

/// Copy the fixture into a tempdir with one settings line rewritten.
fn mutated_fixture(from: &str, to: &str) -> (tempfile::TempDir, String) {
    let content = fs::read_to_string(fixture_path()).expect("read fixture");
    assert!(content.contains(from), "fixture lacks '{from}'");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.gcode");
    fs::write(&path, content.replace(from, to)).expect("write temp gcode");
    (dir, path.to_string_lossy().to_string())
}

#[test]
fn inspect_clean_file_json_reports_ok() {
    let output = pacal_cmd()
        .args(["inspect", &fixture_path(), "--output", "json"])
        .output()
        .expect("run inspect command");

    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid inspect json");
    assert_eq!(json["ok"], true);
    assert_eq!(json["settings"].as_array().expect("settings array").len(), 45);
    assert!(json["diagnostics"].as_array().expect("diagnostics array").is_empty());
}

#[test]
fn inspect_pretty_prints_the_report_table() {
    let output = pacal_cmd()
        .args(["inspect", &fixture_path(), "--output", "pretty"])
        .output()
        .expect("run inspect command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("layer_height"), "missing key row: {stdout}");
    assert!(
        stdout.contains("Rectangular: 250mm x 210mm"),
        "missing bed display: {stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("settings ok"), "stderr={stderr}");
}

#[test]
fn inspect_bad_value_exits_nonzero_with_diagnostic() {
    let (_dir, path) = mutated_fixture("; layer_height = 0.2", "; layer_height = abc");

    let output = pacal_cmd()
        .args(["inspect", &path, "--output", "json"])
        .output()
        .expect("run inspect command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid inspect json");
    assert_eq!(json["ok"], false);
    let diags = json["diagnostics"].as_array().expect("diagnostics array");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["id"], "PA1002");
}

#[test]
fn inspect_unreadable_file_names_it() {
    let output = pacal_cmd()
        .args(["inspect", "no-such-file.gcode"])
        .output()
        .expect("run inspect command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no-such-file.gcode"), "stderr={stderr}");
}
