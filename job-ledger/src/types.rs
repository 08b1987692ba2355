//! Core types for the job ledger

use chrono::{DateTime, Utc};
use match_engine::{MatchReport, NameVariant, Subject};
use risk_engine::RiskAssessment;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet picked up by a worker
    Pending,
    /// A worker is processing the steps
    Running,
    /// All steps completed, result available (terminal)
    Completed,
    /// A step failed (terminal)
    Failed,
}

impl JobStatus {
    /// Terminal states are never revisited
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Step status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not started
    Pending,
    /// In progress
    Active,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

/// The fixed set of screening steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    /// Name variant resolution
    Resolution,
    /// Sanctions list check
    SanctionsCheck,
    /// Politically-exposed-person check
    PepCheck,
    /// Criminal-record check
    CriminalCheck,
    /// Result aggregation and risk scoring
    Aggregation,
}

impl StepName {
    /// All steps in execution order
    pub const ALL: [StepName; 5] = [
        StepName::Resolution,
        StepName::SanctionsCheck,
        StepName::PepCheck,
        StepName::CriminalCheck,
        StepName::Aggregation,
    ];

    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Resolution => "resolution",
            StepName::SanctionsCheck => "sanctions-check",
            StepName::PepCheck => "pep-check",
            StepName::CriminalCheck => "criminal-check",
            StepName::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One named step of a screening job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name
    pub name: StepName,

    /// Current status
    pub status: StepStatus,

    /// Last status message
    pub message: String,

    /// When the step went active
    pub started_at: Option<DateTime<Utc>>,

    /// When the step finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Wall-clock duration once finished
    pub duration_ms: Option<i64>,
}

impl Step {
    pub(crate) fn new(name: StepName) -> Self {
        Self {
            name,
            status: StepStatus::Pending,
            message: String::new(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
        }
    }
}

/// Timestamped progress log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was appended
    pub at: DateTime<Utc>,

    /// Log message
    pub message: String,
}

/// Final outcome of a completed screening job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Filtered, deduplicated per-category matches
    pub report: MatchReport,

    /// Aggregated risk assessment
    pub assessment: RiskAssessment,

    /// Name variants that were queried
    pub variants: Vec<NameVariant>,
}

/// Immutable snapshot of a screening job, safe to hand to polling clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job id
    pub job_id: Uuid,

    /// Subject being screened
    pub subject: Subject,

    /// Current status
    pub status: JobStatus,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// When a worker picked the job up
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Completed steps as a percentage; 100 exactly in terminal states
    pub progress_percent: u8,

    /// Name of the most recently activated step
    pub current_step: Option<StepName>,

    /// Failure message for failed jobs
    pub error_message: Option<String>,

    /// Ordered steps
    pub steps: Vec<Step>,

    /// Most recent log entries, newest last
    pub recent_logs: Vec<LogEntry>,

    /// Screening result, present once completed
    pub result: Option<ScreeningResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_step_order_and_names() {
        assert_eq!(StepName::ALL.len(), 5);
        assert_eq!(StepName::ALL[0].as_str(), "resolution");
        assert_eq!(StepName::ALL[4].as_str(), "aggregation");
        assert_eq!(StepName::SanctionsCheck.to_string(), "sanctions-check");
    }
}
