//! Filter assertions against the analyzer and the standalone checker.
//!
//! [`DfilterChecker`] runs the analyzer over a capture file and compares the
//! number of printed records with an expected count. [`DftestChecker`] runs the
//! filter checker on an expression alone and verifies that it is accepted or
//! rejected with a particular diagnostic.

use crate::command::{AnalyzerCommand, FilterOptions};
use crate::env::BaseEnv;
use crate::process::{InvocationResult, ProcessError, StreamCapture, run};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Exit status of the checker when it rejects a filter's syntax.
pub const SYNTAX_ERROR_EXIT_CODE: i32 = 4;

/// A result that did not match the expected outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    #[error("Expected {expected}, got: {actual}\noutput: {output:?}")]
    CountMismatch {
        expected: usize,
        actual: usize,
        output: String,
    },
    #[error("Unexpected dftest stderr:\n{stderr}\nstdout:\n{stdout}")]
    UnexpectedStderr { stderr: String, stdout: String },
    #[error(
        "Unexpected dftest exit code: {}. stderr:\n{stderr}\nstdout:\n{stdout}",
        display_exit_code(*code)
    )]
    UnexpectedExitCode {
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },
    #[error(
        "Unexpected analyzer exit code: {}. output:\n{output}",
        display_exit_code(*code)
    )]
    AnalyzerFailed { code: Option<i32>, output: String },
    #[error("Expected the string {expected:?} in the output:\n{stdout}")]
    MissingStdout { expected: String, stdout: String },
}

fn display_exit_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Either the harness could not run the program, or the result was wrong.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Assertion(#[from] AssertionError),
}

/// Number of records printed, one per newline.
#[must_use]
pub fn count_records(output: &str) -> usize {
    output.bytes().filter(|&b| b == b'\n').count()
}

/// Compare the record count of a combined-stream result with `expected`.
///
/// # Errors
/// Returns [`AssertionError::AnalyzerFailed`] if the analyzer did not exit
/// with status 0, and [`AssertionError::CountMismatch`] unless the counts are
/// equal.
pub fn evaluate_count(result: &InvocationResult, expected: usize) -> Result<(), AssertionError> {
    if !result.success() {
        return Err(AssertionError::AnalyzerFailed {
            code: result.exit_code,
            output: result.stdout.clone(),
        });
    }
    let actual = count_records(&result.stdout);
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionError::CountMismatch {
            expected,
            actual,
            output: result.stdout.clone(),
        })
    }
}

/// Require a syntax rejection whose stderr contains `error_message`.
///
/// # Errors
/// Returns [`AssertionError::UnexpectedStderr`] if the message is missing and
/// [`AssertionError::UnexpectedExitCode`] if the exit code is not
/// [`SYNTAX_ERROR_EXIT_CODE`].
pub fn evaluate_fail(result: &InvocationResult, error_message: &str) -> Result<(), AssertionError> {
    if !result.stderr.contains(error_message) {
        return Err(AssertionError::UnexpectedStderr {
            stderr: result.stderr.clone(),
            stdout: result.stdout.clone(),
        });
    }
    if result.exit_code != Some(SYNTAX_ERROR_EXIT_CODE) {
        return Err(unexpected_exit_code(result));
    }
    Ok(())
}

/// Require acceptance and, if given, `expect_stdout` in stdout.
///
/// # Errors
/// Returns [`AssertionError::UnexpectedExitCode`] on a non-zero exit and
/// [`AssertionError::MissingStdout`] if the expected text is missing.
pub fn evaluate_succeed(
    result: &InvocationResult,
    expect_stdout: Option<&str>,
) -> Result<(), AssertionError> {
    if !result.success() {
        return Err(unexpected_exit_code(result));
    }
    match expect_stdout {
        Some(expected) if !result.stdout.contains(expected) => Err(AssertionError::MissingStdout {
            expected: expected.to_string(),
            stdout: result.stdout.clone(),
        }),
        _ => Ok(()),
    }
}

fn unexpected_exit_code(result: &InvocationResult) -> AssertionError {
    AssertionError::UnexpectedExitCode {
        code: result.exit_code,
        stderr: result.stderr.clone(),
        stdout: result.stdout.clone(),
    }
}

/// Runs display and read filters over one capture file.
#[derive(Debug, Clone)]
pub struct DfilterChecker {
    analyzer: PathBuf,
    capture_file: PathBuf,
    env: BaseEnv,
}

impl DfilterChecker {
    #[must_use]
    pub fn new(analyzer: impl Into<PathBuf>, capture_file: impl Into<PathBuf>, env: BaseEnv) -> Self {
        Self {
            analyzer: analyzer.into(),
            capture_file: capture_file.into(),
            env,
        }
    }

    #[must_use]
    pub fn capture_file(&self) -> &Path {
        &self.capture_file
    }

    /// The analyzer invocation for `filter` under `options`.
    #[must_use]
    pub fn command(&self, filter: &str, options: &FilterOptions) -> AnalyzerCommand {
        AnalyzerCommand::new(&self.analyzer, &self.capture_file, filter, options)
    }

    /// Run a display filter and expect `expected` packets.
    ///
    /// # Errors
    /// Returns an error if the analyzer cannot be run, exits non-zero, or the
    /// count differs.
    pub fn check_count(
        &self,
        filter: &str,
        expected: usize,
        prefs: Option<&str>,
    ) -> Result<(), HarnessError> {
        let options = FilterOptions {
            prefs: prefs.map(ToString::to_string),
            ..FilterOptions::default()
        };
        self.check(filter, expected, &options)
    }

    /// Run a display filter in two-pass mode with `selected_frame` selected.
    ///
    /// # Errors
    /// Returns an error if the analyzer cannot be run, exits non-zero, or the
    /// count differs.
    pub fn check_count_with_selected_frame(
        &self,
        filter: &str,
        expected: usize,
        selected_frame: NonZeroU32,
        prefs: Option<&str>,
    ) -> Result<(), HarnessError> {
        let options = FilterOptions {
            frame_number: Some(selected_frame),
            prefs: prefs.map(ToString::to_string),
            read_filter: false,
        };
        self.check(filter, expected, &options)
    }

    /// Run a read filter in two-pass mode and expect `expected` packets.
    ///
    /// # Errors
    /// Returns an error if the analyzer cannot be run, exits non-zero, or the
    /// count differs.
    pub fn check_count_read_filter(&self, filter: &str, expected: usize) -> Result<(), HarnessError> {
        self.check(filter, expected, &FilterOptions::read_filter())
    }

    fn check(
        &self,
        filter: &str,
        expected: usize,
        options: &FilterOptions,
    ) -> Result<(), HarnessError> {
        let cmd = self.command(filter, options);
        let result = run(&cmd.program, &cmd.args, &self.env, StreamCapture::Combined)?;
        evaluate_count(&result, expected)?;
        Ok(())
    }
}

/// Runs the standalone filter checker (`<checker> -- <filter>`).
#[derive(Debug, Clone)]
pub struct DftestChecker {
    checker: PathBuf,
    env: BaseEnv,
}

impl DftestChecker {
    #[must_use]
    pub fn new(checker: impl Into<PathBuf>, env: BaseEnv) -> Self {
        Self {
            checker: checker.into(),
            env,
        }
    }

    /// Run the checker on `filter` with separated output streams.
    ///
    /// # Errors
    /// Returns an error if the checker cannot be run.
    pub fn invoke(&self, filter: &str) -> Result<InvocationResult, ProcessError> {
        let args = ["--".to_string(), filter.to_string()];
        run(&self.checker, &args, &self.env, StreamCapture::Separated)
    }

    /// Expect `filter` to be rejected with `error_message` on stderr.
    ///
    /// # Errors
    /// Returns an error if the checker cannot be run, does not exit with
    /// [`SYNTAX_ERROR_EXIT_CODE`], or does not print `error_message`.
    pub fn check_fail(&self, filter: &str, error_message: &str) -> Result<(), HarnessError> {
        let result = self.invoke(filter)?;
        evaluate_fail(&result, error_message)?;
        Ok(())
    }

    /// Expect `filter` to be accepted, optionally printing `expect_stdout`.
    ///
    /// # Errors
    /// Returns an error if the checker cannot be run, exits non-zero, or does
    /// not print `expect_stdout`.
    pub fn check_succeed(&self, filter: &str, expect_stdout: Option<&str>) -> Result<(), HarnessError> {
        let result = self.invoke(filter)?;
        evaluate_succeed(&result, expect_stdout)?;
        Ok(())
    }
}
