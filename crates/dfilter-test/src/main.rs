//! dfilter-test CLI - Conformance test runner for display filters.

use anyhow::{Context, bail};
use clap::Parser;
use comfy_table::{Cell, Color, Table};
use dfilter_test_core::{
    CONFIG_FILE_NAME, CaseResult, ConfigOverrides, ExecutionReport, HarnessConfig, HarnessContext,
    ProgressEvent, ReportFormat, Reporter, ReporterConfig, RunOptions, RunSummary, Suite,
    apply_overrides, default_parallelism, load_config, load_suites, run_suites, suite_totals,
    validate_config,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Exit codes for the CLI.
mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const TEST_FAILED: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
    pub const EXECUTION_ERROR: u8 = 3;
}

#[derive(Parser)]
#[command(name = "dfilter-test")]
#[command(about = "Conformance test runner for display-filter expressions")]
#[command(version)]
struct Cli {
    /// Suite files or directories of suites (default: current directory)
    #[arg(value_name = "SUITE")]
    suites: Vec<PathBuf>,

    /// Configuration file (default: ./dfilter-test.config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the analyzer and checker (overrides config)
    #[arg(long)]
    program_dir: Option<PathBuf>,

    /// Directory trace files are resolved against (overrides config)
    #[arg(long)]
    capture_dir: Option<PathBuf>,

    /// Analyzer program name (overrides config)
    #[arg(long)]
    analyzer: Option<String>,

    /// Checker program name (overrides config)
    #[arg(long)]
    checker: Option<String>,

    /// Filter test cases by `suite::name` (substring match)
    #[arg(long)]
    filter: Option<String>,

    /// Number of cases run at once (default: CPU count)
    #[arg(short, long)]
    parallel: Option<usize>,

    /// Output format: table, json
    #[arg(long, default_value = "table")]
    format: String,

    /// Show per-case durations
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    run_command(&cli).await
}

/// Load the configuration and apply CLI overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let path = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            path.clone()
        }
        None => PathBuf::from(CONFIG_FILE_NAME),
    };
    let config = load_config(&path)?;

    let overrides = ConfigOverrides {
        program_dir: cli.program_dir.clone(),
        analyzer: cli.analyzer.clone(),
        checker: cli.checker.clone(),
        capture_dir: cli.capture_dir.clone(),
        parallel: cli.parallel,
    };
    let config = apply_overrides(config, &overrides);
    validate_config(&config).context("invalid command-line override")?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn resolve_suites(cli: &Cli) -> anyhow::Result<Vec<Suite>> {
    let paths = if cli.suites.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.suites.clone()
    };
    load_suites(&paths).context("failed to load suites")
}

fn print_suite_table(results: &[CaseResult]) {
    let mut table = Table::new();
    table.set_header(vec!["Suite", "Tests", "Passed", "Failed", "Errors", "Time"]);

    for totals in suite_totals(results) {
        let summary = totals.summary;
        let failed_cell = if summary.failed > 0 {
            Cell::new(summary.failed).fg(Color::Red)
        } else {
            Cell::new(summary.failed)
        };
        let errors_cell = if summary.errors > 0 {
            Cell::new(summary.errors).fg(Color::Yellow)
        } else {
            Cell::new(summary.errors)
        };
        table.add_row(vec![
            Cell::new(&totals.suite),
            Cell::new(summary.total),
            Cell::new(summary.passed).fg(Color::Green),
            failed_cell,
            errors_cell,
            Cell::new(format!("{}ms", totals.duration_ms)),
        ]);
    }

    println!("{table}");
}

const fn exit_code_for(summary: &RunSummary) -> u8 {
    if summary.errors > 0 {
        exit_code::EXECUTION_ERROR
    } else if summary.failed > 0 {
        exit_code::TEST_FAILED
    } else {
        exit_code::SUCCESS
    }
}

async fn run_command(cli: &Cli) -> ExitCode {
    let reporter = Reporter::new(ReporterConfig {
        verbose: cli.verbose,
        color: !cli.no_color,
    });

    let report_format: ReportFormat = match cli.format.parse() {
        Ok(f) => f,
        Err(e) => {
            reporter.error(&format!("Invalid format: {e}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };

    let config = match resolve_config(cli) {
        Ok(config) => config,
        Err(e) => {
            reporter.error(&format!("{e:#}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };

    let suites = match resolve_suites(cli) {
        Ok(suites) => suites,
        Err(e) => {
            reporter.error(&format!("{e:#}"));
            return ExitCode::from(exit_code::CONFIG_ERROR);
        }
    };

    let options = RunOptions {
        filter: cli.filter.clone(),
        parallel: config.parallel.unwrap_or_else(default_parallelism),
    };
    let ctx = Arc::new(HarnessContext::from_config(&config));

    let show_progress = report_format == ReportFormat::Table;
    let started_at = OffsetDateTime::now_utc();
    let start_time = Instant::now();

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = reporter.clone();
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if !show_progress {
                continue;
            }
            match event {
                ProgressEvent::RunStarted { total } => printer.run_start(total),
                ProgressEvent::CaseCompleted(result) => printer.case_result(&result),
            }
        }
    });

    let (results, summary) = run_suites(&suites, ctx, &options, Some(progress_tx)).await;
    if let Err(e) = progress_handle.await {
        tracing::warn!(error = %e, "progress printer stopped");
    }
    let duration = start_time.elapsed();

    if results.is_empty() {
        match cli.filter.as_deref() {
            Some(filter) => reporter.warn(&format!("No tests match filter '{filter}'")),
            None => reporter.warn("No test cases found"),
        }
        return ExitCode::from(exit_code::SUCCESS);
    }

    match report_format {
        ReportFormat::Json => {
            let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
            let report = ExecutionReport::new(started_at, duration_ms, summary, results);
            println!("{}", report.to_json());
        }
        ReportFormat::Table => {
            reporter.failures(&results);
            println!();
            print_suite_table(&results);
            reporter.summary(&summary, duration);
        }
    }

    ExitCode::from(exit_code_for(&summary))
}
