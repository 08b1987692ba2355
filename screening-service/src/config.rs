//! Configuration for the screening service

use crate::retry::RetryConfig;
use job_ledger::LedgerConfig;
use match_engine::MatchConfig;
use risk_engine::RiskWeights;
use serde::{Deserialize, Serialize};

/// Screening service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Bound on concurrently running screening jobs
    pub max_concurrent_jobs: usize,

    /// Per-source-call deadline (milliseconds)
    pub source_timeout_ms: u64,

    /// Retry configuration for source calls
    pub retry: RetryConfig,

    /// Job ledger configuration
    pub ledger: LedgerConfig,

    /// Match engine configuration
    pub matching: MatchConfig,

    /// Risk aggregation weights and thresholds
    pub weights: RiskWeights,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            service_name: "screening-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            max_concurrent_jobs: 8,
            source_timeout_ms: 10_000,
            retry: RetryConfig::default(),
            ledger: LedgerConfig::default(),
            matching: MatchConfig::default(),
            weights: RiskWeights::default(),
        }
    }
}

impl ScreeningConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: ScreeningConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = ScreeningConfig::default();

        if let Ok(max) = std::env::var("SCREENING_MAX_CONCURRENT_JOBS") {
            config.max_concurrent_jobs = max.parse().map_err(|_| {
                crate::Error::Config("Invalid SCREENING_MAX_CONCURRENT_JOBS".to_string())
            })?;
        }

        if let Ok(timeout) = std::env::var("SCREENING_SOURCE_TIMEOUT_MS") {
            config.source_timeout_ms = timeout.parse().map_err(|_| {
                crate::Error::Config("Invalid SCREENING_SOURCE_TIMEOUT_MS".to_string())
            })?;
        }

        Ok(config)
    }
}
