//! Serializable analysis reports.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ioc_intel::{Indicator, IndicatorKind, OutcomeState, Outcomes, SourceKind, VerdictResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One analyzed indicator, as emitted by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    /// The indicator as supplied.
    pub indicator: String,
    /// The normalized form sent to providers.
    pub normalized: String,
    pub kind: IndicatorKind,
    #[serde(flatten)]
    pub result: VerdictResult,
    /// How each queried provider answered.
    pub outcomes: BTreeMap<String, OutcomeSummary>,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Served from the verdict cache.
    pub cached: bool,
}

/// Provider answer without its raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub source: SourceKind,
    pub state: OutcomeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisReport {
    pub fn new(
        indicator: &Indicator,
        result: VerdictResult,
        outcomes: &Outcomes,
        elapsed: Duration,
    ) -> Self {
        let outcomes = outcomes
            .iter()
            .map(|(name, outcome)| {
                let summary = OutcomeSummary {
                    source: outcome.source,
                    state: outcome.state,
                    error: outcome.error().map(str::to_owned),
                };
                (name.clone(), summary)
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            indicator: indicator.raw().trim().to_owned(),
            normalized: indicator.normalized().to_owned(),
            kind: indicator.kind(),
            result,
            outcomes,
            analyzed_at: Utc::now(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            cached: false,
        }
    }
}

/// Result of a batch run, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub reports: Vec<AnalysisReport>,
    pub failed: Vec<FailedIndicator>,
    /// Number of reports per verdict name.
    pub verdicts: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn new(reports: Vec<AnalysisReport>, failed: Vec<FailedIndicator>, elapsed: Duration) -> Self {
        let mut verdicts = BTreeMap::new();
        for report in &reports {
            *verdicts
                .entry(report.result.verdict.as_str().to_owned())
                .or_insert(0) += 1;
        }
        Self {
            total: reports.len() + failed.len(),
            succeeded: reports.len(),
            reports,
            failed,
            verdicts,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// An input that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedIndicator {
    pub indicator: String,
    pub reason: String,
}
