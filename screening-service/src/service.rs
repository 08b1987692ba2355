//! Client-facing screening API
//!
//! Transport-agnostic facade over the job ledger and the worker pipeline.
//! Each accepted request runs as an independent background task; a bounded
//! semaphore keeps the number of in-flight screenings from growing without
//! limit under load.

use crate::config::ScreeningConfig;
use crate::error::{Error, Result};
use crate::gateway::SourceRegistry;
use crate::retry::RetryStrategy;
use crate::worker::{run_screening, CancelToken, WorkerContext};
use dashmap::DashMap;
use job_ledger::{spawn_job_ledger, Job, LedgerHandle, ScreeningResult};
use match_engine::{EntityResolver, MatchEngine, Subject};
use risk_engine::RiskAggregator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::info;
use uuid::Uuid;

struct ServiceInner {
    ledger: LedgerHandle,
    registry: Arc<SourceRegistry>,
    resolver: EntityResolver,
    matcher: MatchEngine,
    aggregator: RiskAggregator,
    retry: RetryStrategy,
    permits: Arc<Semaphore>,
    cancels: DashMap<Uuid, CancelToken>,
    source_timeout: Duration,
}

/// Screening orchestration service
#[derive(Clone)]
pub struct ScreeningService {
    inner: Arc<ServiceInner>,
}

impl ScreeningService {
    /// Start the service: spawns the ledger actor and validates the
    /// configured engines.
    pub fn start(config: ScreeningConfig, registry: SourceRegistry) -> Result<Self> {
        let matcher =
            MatchEngine::new(config.matching.clone()).map_err(|e| Error::Config(e.to_string()))?;
        let aggregator = RiskAggregator::new(config.weights.clone())
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.max_concurrent_jobs == 0 {
            return Err(Error::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }

        let ledger = spawn_job_ledger(config.ledger.clone());
        info!(
            "Screening service '{}' started (max {} concurrent jobs)",
            config.service_name, config.max_concurrent_jobs
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                ledger,
                registry: Arc::new(registry),
                resolver: EntityResolver::new(),
                matcher,
                aggregator,
                retry: RetryStrategy::new(config.retry.clone()),
                permits: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
                cancels: DashMap::new(),
                source_timeout: Duration::from_millis(config.source_timeout_ms),
            }),
        })
    }

    /// Create a screening job and start processing it in the background.
    ///
    /// The job is visible to polling immediately; it waits for a worker
    /// permit if the pool is saturated.
    pub async fn create_job(&self, subject: Subject) -> Result<Uuid> {
        if subject.name.trim().is_empty() {
            return Err(Error::Validation(
                "subject name must not be empty".to_string(),
            ));
        }

        let job_id = self.inner.ledger.create_job(subject.clone()).await?;
        let cancel = CancelToken::new();
        self.inner.cancels.insert(job_id, cancel.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // closed semaphore only happens on teardown; drop the job then
            let Ok(_permit) = Arc::clone(&inner.permits).acquire_owned().await else {
                inner.cancels.remove(&job_id);
                return;
            };

            let ctx = WorkerContext {
                ledger: inner.ledger.clone(),
                registry: Arc::clone(&inner.registry),
                resolver: inner.resolver.clone(),
                matcher: inner.matcher.clone(),
                aggregator: inner.aggregator.clone(),
                retry: inner.retry.clone(),
                source_timeout: inner.source_timeout,
                cancel,
            };
            run_screening(ctx, job_id, subject).await;
            inner.cancels.remove(&job_id);
        });

        Ok(job_id)
    }

    /// Current status snapshot of a job
    pub async fn get_status(&self, job_id: Uuid) -> Result<Job> {
        Ok(self.inner.ledger.get_job(job_id).await?)
    }

    /// Screening result, available only once the job completed
    pub async fn get_result(&self, job_id: Uuid) -> Result<ScreeningResult> {
        Ok(self.inner.ledger.get_result(job_id).await?)
    }

    /// Request cooperative cancellation of a running job
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<()> {
        if let Some(token) = self.inner.cancels.get(&job_id) {
            token.cancel();
            return Ok(());
        }
        // unknown id vs already-finished job
        self.inner.ledger.get_job(job_id).await?;
        Ok(())
    }

    /// Shut the ledger actor down
    pub async fn shutdown(&self) -> Result<()> {
        Ok(self.inner.ledger.shutdown().await?)
    }
}
