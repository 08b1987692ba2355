//! Error types for the risk engine

use thiserror::Error;

/// Result type for risk-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Risk-engine errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid weight/threshold configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
