//! Per-case outcomes and batch summaries.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{IngestError, ReasonCode};

/// Tracing target of the structured outcome events.
pub const OUTCOME_TARGET: &str = "case_ingestion";

/// Terminal status of one case in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Success,
    Skipped,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "SUCCESS",
            OutcomeStatus::Skipped => "SKIPPED",
            OutcomeStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outcome recorded for a case.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub case_id: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl IngestOutcome {
    pub fn success(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            status: OutcomeStatus::Success,
            reason: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn skipped(case_id: impl Into<String>, reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            status: OutcomeStatus::Skipped,
            reason: Some(reason),
            detail: Some(detail.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(case_id: impl Into<String>, reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            status: OutcomeStatus::Failed,
            reason: Some(reason),
            detail: Some(detail.into()),
            timestamp: Utc::now(),
        }
    }

    /// Map a per-case error to its outcome.
    ///
    /// Ineligible cases are skipped; every other error fails the case.
    pub fn from_error(case_id: impl Into<String>, err: &IngestError) -> Self {
        match err {
            IngestError::NotEligible { .. } => {
                Self::skipped(case_id, err.reason_code(), err.to_string())
            }
            _ => Self::failed(case_id, err.reason_code(), err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Emit the structured outcome event.
pub fn log_outcome(outcome: &IngestOutcome) {
    let timestamp = outcome.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    let reason = outcome.reason.map(|r| r.as_str()).unwrap_or("");
    let detail = outcome.detail.as_deref().unwrap_or("");

    match outcome.status {
        OutcomeStatus::Failed => warn!(
            target: OUTCOME_TARGET,
            timestamp = %timestamp,
            case_id = %outcome.case_id,
            status = %outcome.status,
            reason = reason,
            detail = detail,
            "Case ingestion outcome"
        ),
        _ => info!(
            target: OUTCOME_TARGET,
            timestamp = %timestamp,
            case_id = %outcome.case_id,
            status = %outcome.status,
            reason = reason,
            detail = detail,
            "Case ingestion outcome"
        ),
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<IngestOutcome>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: IngestOutcome) {
        self.total += 1;
        match outcome.status {
            OutcomeStatus::Success => self.succeeded += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Outcome recorded for a case.
    pub fn outcome_for(&self, case_id: &str) -> Option<&IngestOutcome> {
        self.outcomes.iter().find(|o| o.case_id == case_id)
    }

    /// Number of outcomes with the given reason.
    pub fn count_reason(&self, reason: ReasonCode) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.reason == Some(reason))
            .count()
    }
}
