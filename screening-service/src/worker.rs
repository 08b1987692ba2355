//! Per-job screening pipeline
//!
//! Runs one job through resolution, the concurrent category checks and
//! aggregation, reporting every transition to the job ledger. Source
//! failures degrade to zero hits for the affected variant or category; only
//! unexpected internal errors fail the job.

use crate::error::{Error, Result};
use crate::gateway::{SourceError, SourceQuery, SourceRegistry};
use crate::metrics::{JOBS_TOTAL, SCREENING_DURATION, SOURCE_CALLS_TOTAL};
use crate::retry::RetryStrategy;
use futures::future::join_all;
use job_ledger::{LedgerHandle, ScreeningResult, StepName, StepStatus};
use match_engine::{
    Category, EntityResolver, MatchEngine, NameVariant, Subject, SubjectKind, VariantCandidates,
};
use risk_engine::{CategoryHits, RiskAggregator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

/// Cooperative cancellation flag, checked between pipeline phases and
/// before each round of source calls
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything one screening run needs
pub(crate) struct WorkerContext {
    pub(crate) ledger: LedgerHandle,
    pub(crate) registry: Arc<SourceRegistry>,
    pub(crate) resolver: EntityResolver,
    pub(crate) matcher: MatchEngine,
    pub(crate) aggregator: RiskAggregator,
    pub(crate) retry: RetryStrategy,
    pub(crate) source_timeout: Duration,
    pub(crate) cancel: CancelToken,
}

/// Drive one job to a terminal state
pub(crate) async fn run_screening(ctx: WorkerContext, job_id: Uuid, subject: Subject) {
    let started = Instant::now();
    let kind = match subject.kind {
        SubjectKind::Individual => "individual",
        SubjectKind::Organization => "organization",
    };

    match run_inner(&ctx, job_id, &subject).await {
        Ok(()) => {
            JOBS_TOTAL.with_label_values(&["completed"]).inc();
        }
        Err(Error::Cancelled) => {
            info!("Screening job {} cancelled", job_id);
            JOBS_TOTAL.with_label_values(&["cancelled"]).inc();
            fail_active_step(&ctx, job_id, "Cancelled by client").await;
        }
        Err(e) => {
            warn!("Screening job {} failed: {}", job_id, e);
            JOBS_TOTAL.with_label_values(&["failed"]).inc();
            fail_active_step(&ctx, job_id, &format!("Screening failed: {}", e)).await;
        }
    }

    SCREENING_DURATION
        .with_label_values(&[kind])
        .observe(started.elapsed().as_secs_f64());
}

async fn run_inner(ctx: &WorkerContext, job_id: Uuid, subject: &Subject) -> Result<()> {
    let ledger = &ctx.ledger;

    ensure_not_cancelled(ctx)?;
    ledger
        .transition_step(
            job_id,
            StepName::Resolution,
            StepStatus::Active,
            "Expanding name variants",
        )
        .await?;
    let variants = ctx.resolver.resolve(subject);
    ledger
        .append_log(job_id, format!("Resolved {} name variants", variants.len()))
        .await?;
    ledger
        .transition_step(
            job_id,
            StepName::Resolution,
            StepStatus::Completed,
            format!("{} variants", variants.len()),
        )
        .await?;

    ensure_not_cancelled(ctx)?;

    // only the category checks run in parallel with each other
    let checks = Category::ALL.map(|category| check_category(ctx, job_id, subject, &variants, category));
    let mut batches = Vec::new();
    for outcome in join_all(checks).await {
        batches.extend(outcome?);
    }

    ensure_not_cancelled(ctx)?;

    ledger
        .transition_step(
            job_id,
            StepName::Aggregation,
            StepStatus::Active,
            "Scoring and deduplicating matches",
        )
        .await?;
    let report = ctx.matcher.evaluate(subject, &batches);
    let hits = CategoryHits {
        sanctions: report.sanctions.total_hits,
        pep: report.pep.total_hits,
        criminal: report.criminal.total_hits,
        other: report.other.total_hits,
    };
    let assessment = ctx.aggregator.assess(&hits);
    ledger
        .append_log(
            job_id,
            format!(
                "Risk level {} with {} retained hits",
                assessment.level,
                hits.total()
            ),
        )
        .await?;
    ledger
        .complete_job(
            job_id,
            ScreeningResult {
                report,
                assessment,
                variants,
            },
        )
        .await?;

    info!("Screening job {} completed", job_id);
    Ok(())
}

// Query one category's gateway for every variant concurrently, tolerating
// partial failure. A category where every call fails reports zero hits
// rather than failing the job.
async fn check_category(
    ctx: &WorkerContext,
    job_id: Uuid,
    subject: &Subject,
    variants: &[NameVariant],
    category: Category,
) -> Result<Vec<VariantCandidates>> {
    ensure_not_cancelled(ctx)?;

    let step = step_for(category);
    if let Some(step) = step {
        ctx.ledger
            .transition_step(
                job_id,
                step,
                StepStatus::Active,
                format!("Querying {} sources", category),
            )
            .await?;
    }

    let Some(gateway) = ctx.registry.get(category) else {
        if let Some(step) = step {
            ctx.ledger
                .transition_step(job_id, step, StepStatus::Completed, "No source configured")
                .await?;
        }
        return Ok(Vec::new());
    };

    let calls = variants.iter().map(|variant| {
        let gateway = Arc::clone(&gateway);
        let query = SourceQuery::for_variant(subject, &variant.text);
        let label = format!("{}:{}", category, variant.text);
        async move {
            let outcome = ctx
                .retry
                .execute(
                    || {
                        let gateway = Arc::clone(&gateway);
                        let query = query.clone();
                        async move {
                            match timeout(ctx.source_timeout, gateway.fetch(category, &query)).await
                            {
                                Ok(result) => result,
                                Err(_) => Err(SourceError::Timeout(ctx.source_timeout)),
                            }
                        }
                    },
                    &label,
                )
                .await;
            (variant.clone(), outcome)
        }
    });
    let outcomes = join_all(calls).await;

    let mut batches = Vec::new();
    let mut failures = 0usize;
    let mut raw_count = 0usize;

    for (variant, outcome) in outcomes {
        match outcome {
            Ok(records) => {
                SOURCE_CALLS_TOTAL
                    .with_label_values(&[category.as_str(), "ok"])
                    .inc();
                raw_count += records.len();
                batches.push(VariantCandidates { variant, records });
            }
            Err(e) => {
                SOURCE_CALLS_TOTAL
                    .with_label_values(&[category.as_str(), "error"])
                    .inc();
                failures += 1;
                warn!(
                    "{} source failed for variant '{}': {}",
                    category, variant.text, e
                );
                let _ = ctx
                    .ledger
                    .append_log(
                        job_id,
                        format!("{} source unavailable for '{}'", category, variant.text),
                    )
                    .await;
            }
        }
    }

    if let Some(step) = step {
        let message = if !variants.is_empty() && failures == variants.len() {
            format!("All {} sources failed, reporting 0 hits", category)
        } else {
            format!("{} raw candidates", raw_count)
        };
        ctx.ledger
            .transition_step(job_id, step, StepStatus::Completed, message)
            .await?;
    }

    Ok(batches)
}

fn step_for(category: Category) -> Option<StepName> {
    match category {
        Category::Sanction => Some(StepName::SanctionsCheck),
        Category::Pep => Some(StepName::PepCheck),
        Category::Criminal => Some(StepName::CriminalCheck),
        // adverse information rides along without a dedicated step
        Category::Other => None,
    }
}

fn ensure_not_cancelled(ctx: &WorkerContext) -> Result<()> {
    if ctx.cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

// Best effort: mark the active step (or the next pending one) failed so the
// job lands in FAILED with a meaningful message.
async fn fail_active_step(ctx: &WorkerContext, job_id: Uuid, message: &str) {
    let Ok(job) = ctx.ledger.get_job(job_id).await else {
        return;
    };
    if job.status.is_terminal() {
        return;
    }

    let active = job
        .steps
        .iter()
        .find(|s| s.status == StepStatus::Active)
        .map(|s| s.name);
    let target = active.or_else(|| {
        job.steps
            .iter()
            .find(|s| s.status == StepStatus::Pending)
            .map(|s| s.name)
    });
    let Some(name) = target else {
        return;
    };

    if active.is_none() {
        let _ = ctx
            .ledger
            .transition_step(job_id, name, StepStatus::Active, "")
            .await;
    }
    if let Err(e) = ctx
        .ledger
        .transition_step(job_id, name, StepStatus::Failed, message)
        .await
    {
        warn!("Could not mark job {} as failed: {}", job_id, e);
    }
}
