//! Test output reporter with cargo test-like formatting.

use crate::types::{CaseResult, Outcome, RunSummary};
use std::io::{self, Write};
use std::time::Duration;

/// Reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Show per-case durations.
    pub verbose: bool,
    /// Use colors in output.
    pub color: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}

/// Test reporter with cargo test-like output.
#[derive(Debug, Clone)]
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub const fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    /// Print the start of a run.
    pub fn run_start(&self, total: usize) {
        println!();
        println!("running {total} tests");
        self.flush();
    }

    /// Print a test result line.
    pub fn case_result(&self, result: &CaseResult) {
        println!("{}", self.format_case_line(result));
        self.flush();
    }

    /// Print the failures section.
    pub fn failures(&self, results: &[CaseResult]) {
        if let Some(section) = format_failures(results) {
            print!("{section}");
        }
    }

    /// Print the final summary.
    pub fn summary(&self, summary: &RunSummary, duration: Duration) {
        println!();
        println!("{}", self.format_summary(summary, duration));
        println!();
    }

    /// Print a warning to stderr.
    pub fn warn(&self, message: &str) {
        eprintln!("{} {message}", self.paint("warning:", "33"));
    }

    /// Print an error to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", self.paint("error:", "31"));
    }

    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }

    #[must_use]
    pub fn format_case_line(&self, result: &CaseResult) -> String {
        let mut line = format!(
            "test {} ... {}",
            result.id(),
            self.status_label(&result.outcome)
        );
        if self.config.verbose {
            line.push_str(&format!(" ({}ms)", result.duration_ms));
        }
        line
    }

    #[must_use]
    pub fn format_summary(&self, summary: &RunSummary, duration: Duration) -> String {
        let status = if summary.is_success() {
            self.paint("ok", "32")
        } else {
            self.paint("FAILED", "31")
        };
        format!(
            "test result: {status}. {} passed; {} failed; {} errors; finished in {:.2}s",
            summary.passed,
            summary.failed,
            summary.errors,
            duration.as_secs_f64()
        )
    }

    fn status_label(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Passed => self.paint("ok", "32"),
            Outcome::Failed(_) => self.paint("FAILED", "31"),
            Outcome::Error(_) => self.paint("ERROR", "33"),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.config.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// Format the `failures:` section, or `None` if everything passed.
#[must_use]
pub fn format_failures(results: &[CaseResult]) -> Option<String> {
    let failed: Vec<&CaseResult> = results
        .iter()
        .filter(|r| r.outcome != Outcome::Passed)
        .collect();
    if failed.is_empty() {
        return None;
    }

    let mut out = String::from("\nfailures:\n\n");
    for result in &failed {
        out.push_str(&format!("---- {} ----\n", result.id()));
        if let Some(message) = result.outcome.message() {
            for line in message.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
        out.push('\n');
    }
    out.push_str("failures:\n");
    for result in &failed {
        out.push_str(&format!("    {}\n", result.id()));
    }
    Some(out)
}
