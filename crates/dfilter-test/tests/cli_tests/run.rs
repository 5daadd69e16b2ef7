//! Run tests against fake analyzer and checker scripts.
#![cfg(unix)]

use super::{TestResult, Workspace};
use predicates::prelude::*;

const HTTP_SUITE: &str = r#"
trace-file: http.pcap
cases:
  - name: two_records
    filter: "tcp.port == 80"
    expect: { count: 2 }
  - name: selected_frame
    filter: "frame.number == 2"
    selected-frame: 2
    expect: { count: 2 }
  - name: read_filter
    filter: "frame.number > 1"
    read-filter: true
    expect: { count: 2 }
  - name: bad_syntax
    filter: "frame[0:1] == ff ff"
    expect: { fail: "Unknown field" }
  - name: good_syntax
    filter: "ip"
    expect: { succeed: { stdout: "Filter:" } }
"#;

#[test]
fn test_passing_suite() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", HTTP_SUITE)?;

    ws.command()
        .arg("suites")
        .assert()
        .success()
        .stdout(predicate::str::contains("running 5 tests"))
        .stdout(predicate::str::contains("test http::two_records ... ok"))
        .stdout(predicate::str::contains("test http::bad_syntax ... ok"))
        .stdout(predicate::str::contains(
            "test result: ok. 5 passed; 0 failed; 0 errors;",
        ))
        .stdout(predicate::str::contains("failures:").not());
    Ok(())
}

#[test]
fn test_default_scans_current_directory() -> TestResult {
    let ws = Workspace::with_programs()?;
    std::fs::write(
        ws.path().join("root.yaml"),
        "trace-file: http.pcap\ncases:\n  - {name: any, filter: ip, expect: {count: 2}}\n",
    )?;

    ws.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("test root::any ... ok"));
    Ok(())
}

#[test]
fn test_count_mismatch_fails() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite(
        "count.yaml",
        "trace-file: http.pcap\ncases:\n  - {name: five, filter: tcp, expect: {count: 5}}\n",
    )?;

    ws.command()
        .arg("suites")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("test count::five ... FAILED"))
        .stdout(predicate::str::contains("---- count::five ----"))
        .stdout(predicate::str::contains("Expected 5, got: 2"))
        .stdout(predicate::str::contains("test result: FAILED. 0 passed; 1 failed"));
    Ok(())
}

#[test]
fn test_analyzer_rejection_fails_count() -> TestResult {
    let ws = Workspace::new()?;
    ws.program(
        "tshark",
        "echo 'tshark: \"foo\" is neither a field nor a protocol name.' >&2\nexit 4\n",
    )?;
    ws.suite(
        "bad.yaml",
        "trace-file: http.pcap\ncases:\n  - {name: one, filter: foo, expect: {count: 1}}\n",
    )?;

    ws.command()
        .arg("suites")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("test bad::one ... FAILED"))
        .stdout(predicate::str::contains("Unexpected analyzer exit code: 4."))
        .stdout(predicate::str::contains("neither a field nor a protocol name"));
    Ok(())
}

#[test]
fn test_unexpected_checker_exit_code() -> TestResult {
    let ws = Workspace::new()?;
    ws.program("dftest", "echo 'parse failed' >&2\nexit 1\n")?;
    ws.suite(
        "syntax.yaml",
        "cases:\n  - {name: bad, filter: 'frame[0:1] == ff', expect: {fail: parse}}\n",
    )?;

    ws.command()
        .arg("suites")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unexpected dftest exit code: 1."));
    Ok(())
}

#[test]
fn test_missing_analyzer_is_error() -> TestResult {
    let ws = Workspace::new()?;
    ws.program("dftest", super::SYNTAX_CHECKER)?;
    ws.suite("http.yaml", HTTP_SUITE)?;

    ws.command()
        .arg("suites")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("test http::two_records ... ERROR"))
        .stdout(predicate::str::contains("test http::good_syntax ... ok"))
        .stdout(predicate::str::contains("program 'tshark' not found"));
    Ok(())
}

#[test]
fn test_missing_capture_is_error() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite(
        "dns.yaml",
        "trace-file: dns.pcap\ncases:\n  - {name: query, filter: dns, expect: {count: 2}}\n",
    )?;

    ws.command()
        .arg("suites")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("test dns::query ... ERROR"))
        .stdout(predicate::str::contains("dns.pcap"));
    Ok(())
}

#[test]
fn test_filter_selects_cases() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", HTTP_SUITE)?;

    ws.command()
        .args(["suites", "--filter", "syntax"])
        .assert()
        .success()
        .stdout(predicate::str::contains("running 2 tests"))
        .stdout(predicate::str::contains("http::two_records").not());
    Ok(())
}

#[test]
fn test_filter_without_match_warns() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", HTTP_SUITE)?;

    ws.command()
        .args(["suites", "--filter", "nothing_like_this"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "No tests match filter 'nothing_like_this'",
        ));
    Ok(())
}

#[test]
fn test_program_dir_override() -> TestResult {
    let ws = Workspace::with_programs()?;
    ws.suite("http.yaml", HTTP_SUITE)?;
    std::fs::create_dir(ws.path().join("empty"))?;

    ws.command()
        .args(["suites", "--program-dir", "empty"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("program 'dftest' not found"));
    Ok(())
}

#[test]
fn test_config_env_reaches_programs() -> TestResult {
    let ws = Workspace::new()?;
    ws.program(
        "dftest",
        "if [ \"$DFILTER_MODE\" = strict ] && [ -z \"$HOME_UNSET_CHECK\" ]; then echo ok; exit 0; fi\nexit 1\n",
    )?;
    std::fs::write(
        ws.path().join("dfilter-test.config.yaml"),
        "program-dir: bin\ncapture-dir: captures\nenv:\n  DFILTER_MODE: strict\nenv-remove:\n  - HOME_UNSET_CHECK\n",
    )?;
    ws.suite(
        "env.yaml",
        "cases:\n  - {name: env, filter: ip, expect: {succeed: {stdout: ok}}}\n",
    )?;

    ws.command()
        .arg("suites")
        .env("HOME_UNSET_CHECK", "present")
        .assert()
        .success()
        .stdout(predicate::str::contains("test env::env ... ok"));
    Ok(())
}
