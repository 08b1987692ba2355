//! Prometheus metrics for the screening service

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Screening jobs by terminal outcome
    pub static ref JOBS_TOTAL: CounterVec = register_counter_vec!(
        "screening_jobs_total",
        "Screening jobs by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Source gateway calls by category and status
    pub static ref SOURCE_CALLS_TOTAL: CounterVec = register_counter_vec!(
        "screening_source_calls_total",
        "Source gateway calls by category and status",
        &["category", "status"]
    )
    .unwrap();

    /// End-to-end screening duration
    pub static ref SCREENING_DURATION: HistogramVec = register_histogram_vec!(
        "screening_duration_seconds",
        "End-to-end screening duration in seconds",
        &["subject_kind"]
    )
    .unwrap();
}
