//! Screening job ledger
//!
//! Tracks the lifecycle of screening requests through named steps. The
//! ledger is owned by a single actor task: all mutations of job state go
//! through its mailbox, so progress recomputation and log appends are atomic
//! relative to concurrently polling clients.

#![forbid(unsafe_code)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod types;

pub use actor::{spawn_job_ledger, LedgerHandle};
pub use config::LedgerConfig;
pub use error::{Error, Result};
pub use ledger::JobLedger;
pub use types::{Job, JobStatus, LogEntry, ScreeningResult, Step, StepName, StepStatus};
