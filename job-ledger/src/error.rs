//! Error types for the job ledger

use crate::types::{StepName, StepStatus};
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Job already reached a terminal state
    #[error("Job {0} is terminal and cannot be modified")]
    TerminalJob(Uuid),

    /// Disallowed step transition
    #[error("Invalid transition for step {step}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Step being transitioned
        step: StepName,
        /// Current status
        from: StepStatus,
        /// Requested status
        to: StepStatus,
    },

    /// Result requested before the job completed
    #[error("Result for job {0} is not ready")]
    ResultNotReady(Uuid),

    /// Subject failed validation
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
