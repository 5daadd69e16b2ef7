//! CLI argument tests (no analyzer or checker required).

use super::{TestResult, Workspace, dfilter_test};
use predicates::prelude::*;

#[test]
fn test_arg_help() {
    dfilter_test()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Conformance test runner for display-filter expressions",
        ))
        .stdout(predicate::str::contains("--program-dir"));
}

#[test]
fn test_arg_version() {
    dfilter_test()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dfilter-test"));
}

#[test]
fn test_arg_invalid_format() {
    dfilter_test()
        .args([".", "--format", "invalid"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_arg_unknown_flag() {
    dfilter_test().arg("--no-such-flag").assert().failure();
}

#[test]
fn test_missing_suite_path() {
    dfilter_test()
        .arg("/nonexistent/suites")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("suite path not found"));
}

#[test]
fn test_missing_config_file() {
    dfilter_test()
        .args(["--config", "/nonexistent/dfilter-test.config.yaml", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_zero_parallel_rejected() -> TestResult {
    let ws = Workspace::new()?;
    // Built without the helper's `--parallel 1` default so clap sees one value.
    assert_cmd::Command::new(env!("CARGO_BIN_EXE_dfilter-test"))
        .current_dir(ws.path())
        .args(["--no-color", "--parallel", "0", "suites"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parallel must be at least 1"));
    Ok(())
}

#[test]
fn test_invalid_config_file() -> TestResult {
    let ws = Workspace::new()?;
    std::fs::write(
        ws.path().join("dfilter-test.config.yaml"),
        "analyser: tshark\n",
    )?;
    ws.command()
        .arg("suites")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("dfilter-test.config.yaml"));
    Ok(())
}

#[test]
fn test_invalid_suite_file() -> TestResult {
    let ws = Workspace::new()?;
    ws.suite(
        "bad.yaml",
        "cases:\n  - {name: a, filter: ip, expect: {count: 1}}\n",
    )?;
    ws.command()
        .arg("suites")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("count expectations need a trace-file"));
    Ok(())
}

#[test]
fn test_empty_suite_directory() -> TestResult {
    let ws = Workspace::new()?;
    ws.command()
        .arg("suites")
        .assert()
        .success()
        .stderr(predicate::str::contains("No test cases found"));
    Ok(())
}
