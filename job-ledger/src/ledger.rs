//! Job state machine and in-memory store
//!
//! `JobLedger` is the synchronous state container; the actor in
//! [`crate::actor`] owns one instance and serializes access to it.

use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::types::{Job, JobStatus, LogEntry, ScreeningResult, Step, StepName, StepStatus};
use chrono::{DateTime, Duration, Utc};
use match_engine::Subject;
use std::collections::{HashMap, VecDeque};
use tracing::{info, warn};
use uuid::Uuid;

struct JobRecord {
    job_id: Uuid,
    subject: Subject,
    status: JobStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    progress_percent: u8,
    current_step: Option<StepName>,
    error_message: Option<String>,
    steps: Vec<Step>,
    logs: VecDeque<LogEntry>,
    result: Option<ScreeningResult>,
}

impl JobRecord {
    fn step_mut(&mut self, name: StepName) -> &mut Step {
        // the step list is fixed at creation, every name is present
        self.steps
            .iter_mut()
            .find(|s| s.name == name)
            .unwrap_or_else(|| unreachable!("step list is fixed"))
    }

    fn recompute_progress(&mut self) {
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        self.progress_percent = ((completed * 100) / self.steps.len()) as u8;
    }
}

/// In-memory store of screening jobs with state-machine enforcement
pub struct JobLedger {
    jobs: HashMap<Uuid, JobRecord>,
    config: LedgerConfig,
}

impl JobLedger {
    /// Create an empty ledger
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            jobs: HashMap::new(),
            config,
        }
    }

    /// Allocate a job with all steps pending
    pub fn create_job(&mut self, subject: Subject) -> Result<Uuid> {
        if subject.name.trim().is_empty() {
            return Err(Error::InvalidSubject(
                "subject name must not be empty".to_string(),
            ));
        }

        let job_id = Uuid::new_v4();
        let record = JobRecord {
            job_id,
            subject,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            progress_percent: 0,
            current_step: None,
            error_message: None,
            steps: StepName::ALL.iter().map(|n| Step::new(*n)).collect(),
            logs: VecDeque::with_capacity(self.config.log_capacity),
            result: None,
        };
        self.jobs.insert(job_id, record);

        info!("Created screening job {}", job_id);
        Ok(job_id)
    }

    /// Apply a step transition, enforcing the state machine.
    ///
    /// pending -> active records the start time and the current step;
    /// active -> completed records completion and duration;
    /// active -> failed fails the whole job (sticky) and halts the rest.
    /// Anything else is rejected without mutating state.
    pub fn transition_step(
        &mut self,
        job_id: Uuid,
        name: StepName,
        status: StepStatus,
        message: impl Into<String>,
    ) -> Result<()> {
        let record = self.jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;
        if record.status.is_terminal() {
            return Err(Error::TerminalJob(job_id));
        }

        let message = message.into();
        let now = Utc::now();
        let current = record.step_mut(name).status;

        match (current, status) {
            (StepStatus::Pending, StepStatus::Active) => {
                let step = record.step_mut(name);
                step.status = StepStatus::Active;
                step.started_at = Some(now);
                step.message = message;
                record.current_step = Some(name);
                if record.status == JobStatus::Pending {
                    record.status = JobStatus::Running;
                    record.started_at = Some(now);
                }
            }
            (StepStatus::Active, StepStatus::Completed) => {
                let step = record.step_mut(name);
                step.status = StepStatus::Completed;
                step.completed_at = Some(now);
                step.duration_ms = step.started_at.map(|s| (now - s).num_milliseconds());
                step.message = message;
            }
            (StepStatus::Active, StepStatus::Failed) => {
                let step = record.step_mut(name);
                step.status = StepStatus::Failed;
                step.completed_at = Some(now);
                step.duration_ms = step.started_at.map(|s| (now - s).num_milliseconds());
                step.message = message.clone();

                record.status = JobStatus::Failed;
                record.completed_at = Some(now);
                record.error_message = Some(message);
                record.progress_percent = 100;
                warn!("Job {} failed at step {}", job_id, name);
                return Ok(());
            }
            (from, to) => {
                return Err(Error::InvalidTransition {
                    step: name,
                    from,
                    to,
                });
            }
        }

        record.recompute_progress();
        Ok(())
    }

    /// Append a progress log entry, bounded by the configured capacity
    pub fn append_log(&mut self, job_id: Uuid, message: impl Into<String>) -> Result<()> {
        let record = self.jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;

        if record.logs.len() >= self.config.log_capacity {
            record.logs.pop_front();
        }
        record.logs.push_back(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
        Ok(())
    }

    /// Complete the aggregation step and the job atomically, attaching the
    /// result. Requires the aggregation step to be active so a poller never
    /// observes 100% progress on a non-terminal job.
    pub fn complete_job(&mut self, job_id: Uuid, result: ScreeningResult) -> Result<()> {
        let record = self.jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;
        if record.status.is_terminal() {
            return Err(Error::TerminalJob(job_id));
        }

        let current = record.step_mut(StepName::Aggregation).status;
        if current != StepStatus::Active {
            return Err(Error::InvalidTransition {
                step: StepName::Aggregation,
                from: current,
                to: StepStatus::Completed,
            });
        }

        let now = Utc::now();
        let step = record.step_mut(StepName::Aggregation);
        step.status = StepStatus::Completed;
        step.completed_at = Some(now);
        step.duration_ms = step.started_at.map(|s| (now - s).num_milliseconds());
        step.message = "Risk assessment ready".to_string();

        record.status = JobStatus::Completed;
        record.completed_at = Some(now);
        record.result = Some(result);
        record.recompute_progress();

        info!("Job {} completed", job_id);
        Ok(())
    }

    /// Immutable snapshot for polling clients, with logs capped to the most
    /// recent entries
    pub fn snapshot(&self, job_id: Uuid) -> Result<Job> {
        let record = self.jobs.get(&job_id).ok_or(Error::JobNotFound(job_id))?;

        let skip = record.logs.len().saturating_sub(self.config.recent_logs);
        Ok(Job {
            job_id: record.job_id,
            subject: record.subject.clone(),
            status: record.status,
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            progress_percent: record.progress_percent,
            current_step: record.current_step,
            error_message: record.error_message.clone(),
            steps: record.steps.clone(),
            recent_logs: record.logs.iter().skip(skip).cloned().collect(),
            result: record.result.clone(),
        })
    }

    /// Screening result, only once the job completed
    pub fn result(&self, job_id: Uuid) -> Result<ScreeningResult> {
        let record = self.jobs.get(&job_id).ok_or(Error::JobNotFound(job_id))?;
        match (&record.status, &record.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            _ => Err(Error::ResultNotReady(job_id)),
        }
    }

    /// Drop terminal jobs older than the configured TTL. A TTL of zero
    /// disables eviction. Running jobs are never evicted.
    pub fn evict_expired(&mut self) -> usize {
        if self.config.job_ttl_secs == 0 {
            return 0;
        }
        let cutoff = Utc::now() - Duration::seconds(self.config.job_ttl_secs as i64);
        let before = self.jobs.len();
        self.jobs.retain(|_, record| {
            !(record.status.is_terminal()
                && record.completed_at.map(|t| t < cutoff).unwrap_or(false))
        });

        let evicted = before - self.jobs.len();
        if evicted > 0 {
            info!("Evicted {} expired jobs", evicted);
        }
        evicted
    }

    /// Number of jobs currently held
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the ledger holds no jobs
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_engine::{MatchReport, SubjectKind};
    use risk_engine::{CategoryHits, RiskAggregator};

    fn ledger() -> JobLedger {
        JobLedger::new(LedgerConfig::default())
    }

    fn subject() -> Subject {
        Subject::new("Jane Smith", SubjectKind::Individual).unwrap()
    }

    fn dummy_result() -> ScreeningResult {
        ScreeningResult {
            report: MatchReport::default(),
            assessment: RiskAggregator::with_defaults().assess(&CategoryHits::default()),
            variants: vec![],
        }
    }

    fn run_all_steps(ledger: &mut JobLedger, job_id: Uuid) {
        for name in StepName::ALL {
            ledger
                .transition_step(job_id, name, StepStatus::Active, "start")
                .unwrap();
            if name != StepName::Aggregation {
                ledger
                    .transition_step(job_id, name, StepStatus::Completed, "done")
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_create_job_initializes_steps() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();
        let job = ledger.snapshot(job_id).unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress_percent, 0);
        assert_eq!(job.steps.len(), 5);
        assert!(job.steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let mut ledger = ledger();
        let bad = Subject {
            name: "   ".to_string(),
            kind: SubjectKind::Individual,
            country: None,
            date_of_birth: None,
        };
        assert!(matches!(
            ledger.create_job(bad),
            Err(Error::InvalidSubject(_))
        ));
    }

    #[test]
    fn test_progress_recomputed_per_transition() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();

        ledger
            .transition_step(job_id, StepName::Resolution, StepStatus::Active, "")
            .unwrap();
        assert_eq!(ledger.snapshot(job_id).unwrap().progress_percent, 0);

        ledger
            .transition_step(job_id, StepName::Resolution, StepStatus::Completed, "")
            .unwrap();
        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.progress_percent, 20);
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.steps[0].duration_ms.is_some());
    }

    #[test]
    fn test_invalid_transition_rejected_without_mutation() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();

        // completed before active
        let err = ledger
            .transition_step(job_id, StepName::Resolution, StepStatus::Completed, "")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.steps[0].status, StepStatus::Pending);
    }

    #[test]
    fn test_step_failure_fails_job_sticky() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();

        ledger
            .transition_step(job_id, StepName::Resolution, StepStatus::Active, "")
            .unwrap();
        ledger
            .transition_step(job_id, StepName::Resolution, StepStatus::Failed, "boom")
            .unwrap();

        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("boom"));
        assert_eq!(job.progress_percent, 100);
        // remaining steps stay pending
        assert_eq!(job.steps[1].status, StepStatus::Pending);

        // terminal jobs are never revisited
        let err = ledger
            .transition_step(job_id, StepName::SanctionsCheck, StepStatus::Active, "")
            .unwrap_err();
        assert!(matches!(err, Error::TerminalJob(_)));
    }

    #[test]
    fn test_complete_job_requires_active_aggregation() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();

        assert!(matches!(
            ledger.complete_job(job_id, dummy_result()),
            Err(Error::InvalidTransition { .. })
        ));

        run_all_steps(&mut ledger, job_id);
        ledger.complete_job(job_id, dummy_result()).unwrap();

        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress_percent, 100);
        assert!(job.result.is_some());
    }

    #[test]
    fn test_result_not_ready_until_completed() {
        let mut ledger = ledger();
        let job_id = ledger.create_job(subject()).unwrap();

        assert!(matches!(
            ledger.result(job_id),
            Err(Error::ResultNotReady(_))
        ));

        run_all_steps(&mut ledger, job_id);
        ledger.complete_job(job_id, dummy_result()).unwrap();
        assert!(ledger.result(job_id).is_ok());
    }

    #[test]
    fn test_logs_capped_on_read() {
        let mut ledger = JobLedger::new(LedgerConfig {
            log_capacity: 20,
            recent_logs: 3,
            ..LedgerConfig::default()
        });
        let job_id = ledger.create_job(subject()).unwrap();

        for i in 0..10 {
            ledger.append_log(job_id, format!("entry {}", i)).unwrap();
        }

        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.recent_logs.len(), 3);
        assert_eq!(job.recent_logs[2].message, "entry 9");
    }

    #[test]
    fn test_log_storage_bounded() {
        let mut ledger = JobLedger::new(LedgerConfig {
            log_capacity: 5,
            recent_logs: 10,
            ..LedgerConfig::default()
        });
        let job_id = ledger.create_job(subject()).unwrap();

        for i in 0..12 {
            ledger.append_log(job_id, format!("entry {}", i)).unwrap();
        }

        let job = ledger.snapshot(job_id).unwrap();
        assert_eq!(job.recent_logs.len(), 5);
        assert_eq!(job.recent_logs[0].message, "entry 7");
    }

    #[test]
    fn test_eviction_only_touches_terminal_jobs() {
        let mut ledger = JobLedger::new(LedgerConfig {
            job_ttl_secs: 1,
            ..LedgerConfig::default()
        });

        let running = ledger.create_job(subject()).unwrap();
        let failed = ledger.create_job(subject()).unwrap();
        ledger
            .transition_step(failed, StepName::Resolution, StepStatus::Active, "")
            .unwrap();
        ledger
            .transition_step(failed, StepName::Resolution, StepStatus::Failed, "boom")
            .unwrap();

        // not old enough yet
        assert_eq!(ledger.evict_expired(), 0);

        // age the failed job past the TTL
        if let Some(record) = ledger.jobs.get_mut(&failed) {
            record.completed_at = Some(Utc::now() - Duration::seconds(5));
        }
        assert_eq!(ledger.evict_expired(), 1);
        assert!(ledger.snapshot(running).is_ok());
        assert!(matches!(
            ledger.snapshot(failed),
            Err(Error::JobNotFound(_))
        ));
    }
}
