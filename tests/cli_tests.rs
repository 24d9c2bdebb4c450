//! Integration tests for the council CLI
//!
//! These tests run the actual CLI binary and verify output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the binary to test
fn council_cmd() -> Command {
    let mut cmd = Command::cargo_bin("council").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_flag() {
    council_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pluggable aggregation engine"))
        .stdout(predicate::str::contains("fizzbuzz"))
        .stdout(predicate::str::contains("seven-boom"));
}

#[test]
fn test_fizzbuzz_help() {
    council_cmd()
        .args(["fizzbuzz", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--from"))
        .stdout(predicate::str::contains("--trace"));
}

#[test]
fn test_missing_subcommand_fails() {
    council_cmd().assert().failure();
}

// ============================================================================
// FizzBuzz
// ============================================================================

#[test]
fn test_fizzbuzz_default_range() {
    let expected = "1\n2\nFizz\n4\nBuzz\nFizz\n7\n8\nFizz\nBuzz\n11\nFizz\n13\n14\nFizzBuzz\n";
    council_cmd()
        .arg("fizzbuzz")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_fizzbuzz_custom_range() {
    council_cmd()
        .args(["fizzbuzz", "--from", "29", "--to", "31"])
        .assert()
        .success()
        .stdout("29\nFizzBuzz\n31\n");
}

#[test]
fn test_fizzbuzz_json() {
    let output = council_cmd()
        .args(["fizzbuzz", "--from", "14", "--to", "15", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        rows,
        serde_json::json!([
            { "n": 14, "result": ["14"] },
            { "n": 15, "result": ["Fizz", "Buzz"] },
        ])
    );
}

#[test]
fn test_fizzbuzz_trace() {
    let output = council_cmd()
        .args(["fizzbuzz", "--from", "3", "--to", "3", "--trace"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let trace = rows[0]["trace"].as_array().unwrap();
    assert_eq!(trace.first().unwrap()["kind"]["type"], "call_started");
    assert_eq!(trace.last().unwrap()["kind"]["type"], "call_completed");
    assert!(trace
        .iter()
        .any(|e| e["kind"]["type"] == "member_invoked" && e["kind"]["name"] == "fizz"));
}

// ============================================================================
// Seven boom
// ============================================================================

#[test]
fn test_seven_boom() {
    council_cmd()
        .args(["seven-boom", "7", "8", "17", "-14", "22"])
        .assert()
        .success()
        .stdout("7 boom\n8\n17 boom\n-14 boom\n22\n");
}

#[test]
fn test_seven_boom_requires_numbers() {
    council_cmd().arg("seven-boom").assert().failure();
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_file_is_used() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("council.yaml");
    fs::write(&config, "name: strict\nmax_invocations: 10\n").unwrap();

    council_cmd()
        .args(["--config", config.to_str().unwrap(), "fizzbuzz", "--to", "5"])
        .assert()
        .success()
        .stdout("1\n2\nFizz\n4\nBuzz\n");
}

#[test]
fn test_invocation_limit_reports_fix() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("council.yaml");
    fs::write(&config, "max_invocations: 1\n").unwrap();

    council_cmd()
        .args(["--config", config.to_str().unwrap(), "fizzbuzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("COUNCIL-004"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_malformed_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("council.yaml");
    fs::write(&config, "max_invocations: [not, a, number]\n").unwrap();

    council_cmd()
        .args(["--config", config.to_str().unwrap(), "seven-boom", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config parse error"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_missing_config_file() {
    council_cmd()
        .args(["--config", "/nonexistent/council.yaml", "fizzbuzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}
