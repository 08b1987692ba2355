//! Actor-based ownership of the job ledger
//!
//! A single task owns the `JobLedger`; workers and polling clients talk to it
//! through a cloneable handle. The mailbox serializes every mutation, so a
//! snapshot never observes a half-applied transition, and a bounded channel
//! provides backpressure. The actor also sweeps expired terminal jobs on a
//! timer tick.

use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::ledger::JobLedger;
use crate::types::{Job, ScreeningResult, StepName, StepStatus};
use match_engine::Subject;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration};
use uuid::Uuid;

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Create a job
    CreateJob {
        /// Subject to screen
        subject: Subject,
        /// Reply channel
        reply: oneshot::Sender<Result<Uuid>>,
    },

    /// Apply a step transition
    TransitionStep {
        /// Job id
        job_id: Uuid,
        /// Step to transition
        step: StepName,
        /// New status
        status: StepStatus,
        /// Status message
        message: String,
        /// Reply channel
        reply: oneshot::Sender<Result<()>>,
    },

    /// Append a progress log entry
    AppendLog {
        /// Job id
        job_id: Uuid,
        /// Log message
        message: String,
        /// Reply channel
        reply: oneshot::Sender<Result<()>>,
    },

    /// Complete the job with its result
    CompleteJob {
        /// Job id
        job_id: Uuid,
        /// Final result
        result: Box<ScreeningResult>,
        /// Reply channel
        reply: oneshot::Sender<Result<()>>,
    },

    /// Snapshot a job for polling
    GetJob {
        /// Job id
        job_id: Uuid,
        /// Reply channel
        reply: oneshot::Sender<Result<Job>>,
    },

    /// Fetch the result of a completed job
    GetResult {
        /// Job id
        job_id: Uuid,
        /// Reply channel
        reply: oneshot::Sender<Result<ScreeningResult>>,
    },

    /// Shut the actor down
    Shutdown,
}

/// Actor that owns the ledger state
pub struct LedgerActor {
    ledger: JobLedger,
    mailbox: mpsc::Receiver<LedgerMessage>,
    eviction_interval: Duration,
}

impl LedgerActor {
    fn new(config: LedgerConfig, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        let eviction_interval = Duration::from_secs(config.eviction_interval_secs.max(1));
        Self {
            ledger: JobLedger::new(config),
            mailbox,
            eviction_interval,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut eviction_timer = interval(self.eviction_interval);
        eviction_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(msg) = self.mailbox.recv() => {
                    match msg {
                        LedgerMessage::Shutdown => break,
                        _ => self.handle_message(msg),
                    }
                }

                _ = eviction_timer.tick() => {
                    self.ledger.evict_expired();
                }

                else => break,
            }
        }
    }

    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::CreateJob { subject, reply } => {
                let _ = reply.send(self.ledger.create_job(subject));
            }
            LedgerMessage::TransitionStep {
                job_id,
                step,
                status,
                message,
                reply,
            } => {
                let _ = reply.send(self.ledger.transition_step(job_id, step, status, message));
            }
            LedgerMessage::AppendLog {
                job_id,
                message,
                reply,
            } => {
                let _ = reply.send(self.ledger.append_log(job_id, message));
            }
            LedgerMessage::CompleteJob {
                job_id,
                result,
                reply,
            } => {
                let _ = reply.send(self.ledger.complete_job(job_id, *result));
            }
            LedgerMessage::GetJob { job_id, reply } => {
                let _ = reply.send(self.ledger.snapshot(job_id));
            }
            LedgerMessage::GetResult { job_id, reply } => {
                let _ = reply.send(self.ledger.result(job_id));
            }
            LedgerMessage::Shutdown => {}
        }
    }
}

/// Cloneable handle for sending messages to the ledger actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a job
    pub async fn create_job(&self, subject: Subject) -> Result<Uuid> {
        self.request(|reply| LedgerMessage::CreateJob { subject, reply })
            .await
    }

    /// Apply a step transition
    pub async fn transition_step(
        &self,
        job_id: Uuid,
        step: StepName,
        status: StepStatus,
        message: impl Into<String>,
    ) -> Result<()> {
        let message = message.into();
        self.request(|reply| LedgerMessage::TransitionStep {
            job_id,
            step,
            status,
            message,
            reply,
        })
        .await
    }

    /// Append a progress log entry
    pub async fn append_log(&self, job_id: Uuid, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.request(|reply| LedgerMessage::AppendLog {
            job_id,
            message,
            reply,
        })
        .await
    }

    /// Complete the job with its result
    pub async fn complete_job(&self, job_id: Uuid, result: ScreeningResult) -> Result<()> {
        self.request(|reply| LedgerMessage::CompleteJob {
            job_id,
            result: Box::new(result),
            reply,
        })
        .await
    }

    /// Snapshot a job for polling
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        self.request(|reply| LedgerMessage::GetJob { job_id, reply })
            .await
    }

    /// Fetch the result of a completed job
    pub async fn get_result(&self, job_id: Uuid) -> Result<ScreeningResult> {
        self.request(|reply| LedgerMessage::GetResult { job_id, reply })
            .await
    }

    /// Shut the actor down
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor and return its handle
pub fn spawn_job_ledger(config: LedgerConfig) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
    let actor = LedgerActor::new(config, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle { sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;
    use match_engine::SubjectKind;

    fn subject() -> Subject {
        Subject::new("Jane Smith", SubjectKind::Individual).unwrap()
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn_job_ledger(LedgerConfig::default());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_create_and_poll() {
        let handle = spawn_job_ledger(LedgerConfig::default());

        let job_id = handle.create_job(subject()).await.unwrap();
        handle
            .transition_step(job_id, StepName::Resolution, StepStatus::Active, "start")
            .await
            .unwrap();
        handle.append_log(job_id, "expanding variants").await.unwrap();

        let job = handle.get_job(job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.current_step, Some(StepName::Resolution));
        assert_eq!(job.recent_logs.len(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_concurrent_pollers() {
        let handle = spawn_job_ledger(LedgerConfig::default());
        let job_id = handle.create_job(subject()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move { h.get_job(job_id).await }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        handle.shutdown().await.unwrap();
    }
}
