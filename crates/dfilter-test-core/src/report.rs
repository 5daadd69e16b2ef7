//! Report generation for run results.

use crate::types::{CaseResult, Outcome, RunSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Format for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown format: {s}. Valid formats: table, json")),
        }
    }
}

/// Machine-readable report of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub started_at: String,
    pub duration_ms: u64,
    pub summary: RunSummary,
    pub results: Vec<CaseResult>,
}

impl ExecutionReport {
    #[must_use]
    pub fn new(
        started_at: OffsetDateTime,
        duration_ms: u64,
        summary: RunSummary,
        results: Vec<CaseResult>,
    ) -> Self {
        Self {
            started_at: started_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| started_at.unix_timestamp().to_string()),
            duration_ms,
            summary,
            results,
        }
    }

    /// Pretty-printed JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Totals for one suite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteTotals {
    pub suite: String,
    pub summary: RunSummary,
    pub duration_ms: u64,
}

/// Group results by suite, in suite-name order.
#[must_use]
pub fn suite_totals(results: &[CaseResult]) -> Vec<SuiteTotals> {
    let mut by_suite: BTreeMap<&str, SuiteTotals> = BTreeMap::new();
    for result in results {
        let totals = by_suite
            .entry(result.suite.as_str())
            .or_insert_with(|| SuiteTotals {
                suite: result.suite.clone(),
                ..SuiteTotals::default()
            });
        totals.summary.total += 1;
        match result.outcome {
            Outcome::Passed => totals.summary.passed += 1,
            Outcome::Failed(_) => totals.summary.failed += 1,
            Outcome::Error(_) => totals.summary.errors += 1,
        }
        totals.duration_ms = totals.duration_ms.saturating_add(result.duration_ms);
    }
    by_suite.into_values().collect()
}
