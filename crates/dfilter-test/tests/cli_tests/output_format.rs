//! Output format tests for JSON and table output.
#![cfg(unix)]

use super::{TestResult, Workspace};
use predicates::prelude::*;

const SUITE: &str = r#"
trace-file: http.pcap
cases:
  - name: two
    filter: tcp
    expect: { count: 2 }
  - name: three
    filter: udp
    expect: { count: 3 }
"#;

#[test]
fn test_json_output() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", SUITE)?;

    let output = ws
        .command()
        .args(["suites", "--format", "json"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert!(value["started_at"].is_string());
    assert!(value["duration_ms"].is_u64());
    assert_eq!(value["summary"]["total"], 2);
    assert_eq!(value["summary"]["passed"], 1);
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["results"][0]["suite"], "http");
    assert_eq!(value["results"][0]["name"], "two");
    assert_eq!(value["results"][0]["outcome"]["status"], "passed");
    assert_eq!(value["results"][1]["outcome"]["status"], "failed");
    let message = value["results"][1]["outcome"]["message"]
        .as_str()
        .ok_or("message should be a string")?;
    assert!(message.starts_with("Expected 3, got: 2"));
    Ok(())
}

#[test]
fn test_json_output_has_no_progress_lines() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", SUITE)?;

    ws.command()
        .args(["suites", "--format", "json"])
        .assert()
        .stdout(predicate::str::contains("running 2 tests").not())
        .stdout(predicate::str::starts_with("{"));
    Ok(())
}

#[test]
fn test_table_output_has_suite_summary() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", SUITE)?;
    ws.suite(
        "syntax.yaml",
        "cases:\n  - {name: ok, filter: ip, expect: {succeed: {}}}\n",
    )?;

    ws.command()
        .arg("suites")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Suite"))
        .stdout(predicate::str::contains("Errors"))
        .stdout(predicate::str::contains("syntax"))
        .stdout(predicate::str::contains(
            "test result: FAILED. 2 passed; 1 failed; 0 errors;",
        ));
    Ok(())
}

#[test]
fn test_verbose_shows_durations() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", SUITE)?;

    ws.command()
        .args(["suites", "--verbose"])
        .assert()
        .stdout(predicate::str::is_match(r"test http::two \.\.\. ok \(\d+ms\)")?);
    Ok(())
}
