//! Core data types for dfilter-test suites and results.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Expected outcome of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expect {
    /// The analyzer prints exactly this many records.
    Count(usize),
    /// The checker rejects the filter with this text on stderr.
    Fail(String),
    /// The checker accepts the filter.
    Succeed(SucceedExpect),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SucceedExpect {
    /// Text that must appear on the checker's stdout.
    #[serde(default)]
    pub stdout: Option<String>,
}

/// A test case definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    pub filter: String,
    pub expect: Expect,
    /// Overrides the suite's trace file.
    #[serde(default)]
    pub trace_file: Option<String>,
    #[serde(default)]
    pub selected_frame: Option<NonZeroU32>,
    #[serde(default)]
    pub prefs: Option<String>,
    #[serde(default)]
    pub read_filter: bool,
}

impl TestCase {
    /// Trace file for this case, falling back to the suite's.
    #[must_use]
    pub fn resolved_trace_file<'a>(&'a self, suite: &'a SuiteFile) -> Option<&'a str> {
        self.trace_file
            .as_deref()
            .or(suite.trace_file.as_deref())
    }
}

/// Contents of one suite file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SuiteFile {
    #[serde(default)]
    pub trace_file: Option<String>,
    pub cases: Vec<TestCase>,
}

/// A loaded and validated suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    /// File stem of the suite file.
    pub name: String,
    pub path: PathBuf,
    pub file: SuiteFile,
}

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// The assertion did not hold.
    Failed(String),
    /// The case could not be run (missing program or capture file).
    Error(String),
}

impl Outcome {
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed(message) | Self::Error(message) => Some(message),
        }
    }
}

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub suite: String,
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

impl CaseResult {
    /// `suite::name`, used for display and filtering.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl RunSummary {
    #[must_use]
    pub fn from_results(results: &[CaseResult]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, result| {
                match result.outcome {
                    Outcome::Passed => summary.passed += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                    Outcome::Error(_) => summary.errors += 1,
                }
                summary
            },
        )
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}
