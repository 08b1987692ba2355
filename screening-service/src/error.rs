//! Error types for the screening service

use crate::gateway::SourceError;
use thiserror::Error;

/// Result type for screening-service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Screening-service errors
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected before a job was created
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ledger error
    #[error(transparent)]
    Ledger(#[from] job_ledger::Error),

    /// Source gateway error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Job was cancelled by the client
    #[error("Job cancelled by client")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
