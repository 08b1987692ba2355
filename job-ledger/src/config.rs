//! Configuration for the job ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// Maximum log entries retained per job
    pub log_capacity: usize,

    /// Log entries returned in a status snapshot
    pub recent_logs: usize,

    /// Seconds a terminal job stays available for polling; 0 disables
    /// eviction
    pub job_ttl_secs: u64,

    /// Seconds between eviction sweeps
    pub eviction_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
            log_capacity: 50,
            recent_logs: 10,
            job_ttl_secs: 3600, // 1 hour
            eviction_interval_secs: 60,
        }
    }
}

impl LedgerConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(ttl) = std::env::var("JOB_LEDGER_TTL_SECS") {
            config.job_ttl_secs = ttl
                .parse()
                .map_err(|_| crate::Error::Config("Invalid JOB_LEDGER_TTL_SECS".to_string()))?;
        }

        if let Ok(cap) = std::env::var("JOB_LEDGER_LOG_CAPACITY") {
            config.log_capacity = cap
                .parse()
                .map_err(|_| crate::Error::Config("Invalid JOB_LEDGER_LOG_CAPACITY".to_string()))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.mailbox_capacity, 256);
        assert_eq!(config.recent_logs, 10);
        assert_eq!(config.job_ttl_secs, 3600);
    }
}
