//! Suite runner: executes loaded cases through the filter assertions.

use crate::assertion::{AssertionError, DfilterChecker, DftestChecker, HarnessError};
use crate::capture::{CaptureError, CaptureResolver};
use crate::config::HarnessConfig;
use crate::env::BaseEnv;
use crate::process::ProcessError;
use crate::program::locate;
use crate::types::{CaseResult, Expect, Outcome, RunSummary, Suite, TestCase};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Cases have been selected and are about to run.
    RunStarted { total: usize },
    /// A case has finished.
    CaseCompleted(CaseResult),
}

/// Sender for progress events.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

/// Errors that stop a single case.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Assertion(#[from] AssertionError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("{0}")]
    ProgramUnavailable(String),
    #[error("no trace file for count expectation")]
    MissingTraceFile,
    #[error("case aborted: {0}")]
    Aborted(String),
}

impl From<HarnessError> for RunnerError {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::Process(e) => Self::Process(e),
            HarnessError::Assertion(e) => Self::Assertion(e),
        }
    }
}

/// Fixed dependencies shared by every case of a run.
#[derive(Debug, Clone)]
pub struct HarnessContext {
    analyzer: Result<PathBuf, String>,
    checker: Result<PathBuf, String>,
    captures: CaptureResolver,
    env: BaseEnv,
}

impl HarnessContext {
    #[must_use]
    pub const fn new(
        analyzer: PathBuf,
        checker: PathBuf,
        captures: CaptureResolver,
        env: BaseEnv,
    ) -> Self {
        Self {
            analyzer: Ok(analyzer),
            checker: Ok(checker),
            captures,
            env,
        }
    }

    /// Locate programs and build the base environment from `config`.
    ///
    /// A program that cannot be found only fails the cases that need it.
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        let find = |name: &str| {
            locate(name, config.program_dir.as_deref()).map_err(|e| {
                tracing::warn!(program = name, error = %e, "program unavailable");
                e.to_string()
            })
        };
        Self {
            analyzer: find(&config.analyzer),
            checker: find(&config.checker),
            captures: CaptureResolver::new(&config.capture_dir),
            env: BaseEnv::inherit().with_overrides(&config.env, &config.env_remove),
        }
    }

    fn analyzer(&self) -> Result<PathBuf, RunnerError> {
        self.analyzer
            .clone()
            .map_err(RunnerError::ProgramUnavailable)
    }

    fn checker(&self) -> Result<PathBuf, RunnerError> {
        self.checker
            .clone()
            .map_err(RunnerError::ProgramUnavailable)
    }
}

/// Options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only run cases whose `suite::name` contains this text.
    pub filter: Option<String>,
    /// Maximum number of cases running at once.
    pub parallel: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            filter: None,
            parallel: default_parallelism(),
        }
    }
}

/// Get the default parallelism level (number of CPU cores).
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// One case with everything it needs, detached from its suite.
#[derive(Debug, Clone)]
struct CaseJob {
    index: usize,
    suite: String,
    trace_file: Option<String>,
    case: TestCase,
}

impl CaseJob {
    fn id(&self) -> String {
        format!("{}::{}", self.suite, self.case.name)
    }
}

fn collect_jobs(suites: &[Suite], filter: Option<&str>) -> Vec<CaseJob> {
    suites
        .iter()
        .flat_map(|suite| {
            suite.file.cases.iter().map(move |case| CaseJob {
                index: 0,
                suite: suite.name.clone(),
                trace_file: case.resolved_trace_file(&suite.file).map(ToString::to_string),
                case: case.clone(),
            })
        })
        .filter(|job| filter.is_none_or(|f| job.id().contains(f)))
        .enumerate()
        .map(|(index, job)| CaseJob { index, ..job })
        .collect()
}

/// Run a single case to completion.
///
/// # Errors
/// Returns [`RunnerError::Assertion`] if the expectation does not hold, and
/// another variant if the case could not be run.
pub fn execute_case(
    ctx: &HarnessContext,
    trace_file: Option<&str>,
    case: &TestCase,
) -> Result<(), RunnerError> {
    match &case.expect {
        Expect::Count(expected) => {
            let trace = trace_file.ok_or(RunnerError::MissingTraceFile)?;
            let capture_file = ctx.captures.resolve(trace)?;
            let checker = DfilterChecker::new(ctx.analyzer()?, capture_file, ctx.env.clone());
            let prefs = case.prefs.as_deref();
            if case.read_filter {
                checker.check_count_read_filter(&case.filter, *expected)?;
            } else if let Some(frame) = case.selected_frame {
                checker.check_count_with_selected_frame(&case.filter, *expected, frame, prefs)?;
            } else {
                checker.check_count(&case.filter, *expected, prefs)?;
            }
        }
        Expect::Fail(error_message) => {
            DftestChecker::new(ctx.checker()?, ctx.env.clone())
                .check_fail(&case.filter, error_message)?;
        }
        Expect::Succeed(expect) => {
            DftestChecker::new(ctx.checker()?, ctx.env.clone())
                .check_succeed(&case.filter, expect.stdout.as_deref())?;
        }
    }
    Ok(())
}

fn outcome_of(result: Result<(), RunnerError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Passed,
        Err(RunnerError::Assertion(e)) => Outcome::Failed(e.to_string()),
        Err(e) => Outcome::Error(e.to_string()),
    }
}

fn run_job(ctx: &HarnessContext, job: &CaseJob) -> CaseResult {
    let start = Instant::now();
    let outcome = outcome_of(execute_case(ctx, job.trace_file.as_deref(), &job.case));
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    tracing::debug!(case = %job.id(), ?outcome, duration_ms, "case finished");
    CaseResult {
        suite: job.suite.clone(),
        name: job.case.name.clone(),
        outcome,
        duration_ms,
    }
}

/// Run every selected case of `suites`.
///
/// Cases run on the blocking thread pool, at most `options.parallel` at a
/// time. Results are returned in suite-file order regardless of completion
/// order.
pub async fn run_suites(
    suites: &[Suite],
    ctx: Arc<HarnessContext>,
    options: &RunOptions,
    progress: Option<ProgressSender>,
) -> (Vec<CaseResult>, RunSummary) {
    use futures::{StreamExt, stream};

    let jobs = collect_jobs(suites, options.filter.as_deref());
    let total = jobs.len();
    let parallel = options.parallel.max(1);
    tracing::info!(total, parallel, "starting run");

    if let Some(ref tx) = progress {
        let _ = tx.send(ProgressEvent::RunStarted { total });
    }

    let futures = jobs.into_iter().map(|job| {
        let ctx = Arc::clone(&ctx);
        let progress = progress.clone();
        async move {
            let index = job.index;
            let fallback = (job.suite.clone(), job.case.name.clone());
            let result = match tokio::task::spawn_blocking(move || run_job(&ctx, &job)).await {
                Ok(result) => result,
                Err(e) => CaseResult {
                    suite: fallback.0,
                    name: fallback.1,
                    outcome: outcome_of(Err(RunnerError::Aborted(e.to_string()))),
                    duration_ms: 0,
                },
            };
            if let Some(tx) = progress {
                let _ = tx.send(ProgressEvent::CaseCompleted(result.clone()));
            }
            (index, result)
        }
    });

    let mut indexed: Vec<(usize, CaseResult)> = stream::iter(futures)
        .buffer_unordered(parallel)
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);

    let results: Vec<CaseResult> = indexed.into_iter().map(|(_, result)| result).collect();
    let summary = RunSummary::from_results(&results);
    tracing::info!(
        passed = summary.passed,
        failed = summary.failed,
        errors = summary.errors,
        "run finished"
    );
    (results, summary)
}
