use thiserror::Error;

/// Result type for match-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Match-engine errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Subject name is empty or whitespace-only
    #[error("Subject name must not be empty")]
    EmptySubject,

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
