//! Core library for the dfilter-test CLI.
//!
//! This crate provides the harness for testing display filters against an
//! analyzer and a filter checker:
//! - Analyzer command construction (display filter, read filter, two-pass)
//! - Process execution with combined or separated output streams
//! - Count, fail and succeed assertions
//! - Suite loading from YAML and harness configuration
//! - Parallel suite execution and report generation

pub mod assertion;
pub mod capture;
pub mod command;
pub mod config;
pub mod env;
pub mod loader;
pub mod process;
pub mod program;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod types;

#[cfg(all(test, unix))]
mod testutil;

pub use assertion::{
    AssertionError, DfilterChecker, DftestChecker, HarnessError, SYNTAX_ERROR_EXIT_CODE,
    count_records, evaluate_count, evaluate_fail, evaluate_succeed,
};
pub use capture::{CaptureError, CaptureResolver};
pub use command::{AnalyzerCommand, FilterOptions, FilterRole, InvocationMode, build_args};
pub use config::{
    CONFIG_FILE_NAME, ConfigError, ConfigOverrides, HarnessConfig, apply_overrides, load_config,
    validate_config,
};
pub use env::BaseEnv;
pub use loader::{LoaderError, discover_suite_files, load_suite, load_suites};
pub use process::{InvocationResult, ProcessError, StreamCapture};
pub use program::{ProgramError, locate};
pub use report::{ExecutionReport, ReportFormat, SuiteTotals, suite_totals};
pub use reporter::{Reporter, ReporterConfig, format_failures};
pub use runner::{
    HarnessContext, ProgressEvent, ProgressSender, RunOptions, RunnerError, default_parallelism,
    execute_case, run_suites,
};
pub use types::*;
