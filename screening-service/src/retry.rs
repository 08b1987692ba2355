//! Retry with exponential backoff and jitter for source calls

use crate::gateway::SourceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    pub max_retries: u32,

    /// First backoff delay
    pub initial_delay_ms: u64,

    /// Backoff ceiling
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt
    pub backoff_multiplier: f64,

    /// Jitter as a fraction of the delay
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 200,
            max_delay_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// Executes source calls with bounded retries on transient failures
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    /// Create a strategy from configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Strategy with default configuration
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    // Delay for the nth retry: exponential backoff with jitter to avoid
    // thundering-herd retries against a recovering source.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay_ms as f64
            * self.config.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.config.max_delay_ms as f64);

        let jitter_range = capped * self.config.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * jitter_range * 2.0;
        let delay = (capped + jitter).max(0.0);

        Duration::from_millis(delay as u64)
    }

    /// Run `operation`, retrying transient failures up to the configured
    /// bound. Permanent failures return immediately.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> std::result::Result<T, SourceError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, SourceError>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.calculate_delay(attempt - 1);
                warn!(
                    "Retry {}/{} for {} after {:?}",
                    attempt, self.config.max_retries, operation_name, delay
                );
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("{} succeeded on retry {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_transient() {
                        warn!("Non-retryable error for {}: {}", operation_name, e);
                        return Err(e);
                    }
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        operation_name,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SourceError::Transport("retries exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_jitter(max_retries: u32) -> RetryStrategy {
        RetryStrategy::new(RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 10,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        })
    }

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::new(RetryConfig {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        });

        assert_eq!(strategy.calculate_delay(0).as_millis(), 100);
        assert_eq!(strategy.calculate_delay(1).as_millis(), 200);
        assert_eq!(strategy.calculate_delay(2).as_millis(), 400);
        // capped
        assert_eq!(strategy.calculate_delay(10).as_millis(), 1_000);
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let strategy = no_jitter(3);
        let attempts = AtomicU32::new(0);

        let result = strategy
            .execute(
                || {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(SourceError::UpstreamStatus(503))
                        } else {
                            Ok(42)
                        }
                    }
                },
                "test-call",
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let strategy = no_jitter(3);
        let attempts = AtomicU32::new(0);

        let result: std::result::Result<u32, _> = strategy
            .execute(
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err(SourceError::UpstreamStatus(401)) }
                },
                "test-call",
            )
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_returns_last_error() {
        let strategy = no_jitter(2);

        let result: std::result::Result<u32, _> = strategy
            .execute(
                || async { Err(SourceError::RateLimited) },
                "test-call",
            )
            .await;

        assert!(matches!(result, Err(SourceError::RateLimited)));
    }
}
