//! Screening orchestration service
//!
//! Runs compliance screening jobs end to end: resolves name variants, fans
//! out per-category source queries concurrently, scores and deduplicates the
//! returned candidates, aggregates risk, and tracks the whole lifecycle in
//! the job ledger for client polling.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod retry;
pub mod service;
pub mod source;
pub mod worker;

pub use config::ScreeningConfig;
pub use error::{Error, Result};
pub use gateway::{SourceError, SourceGateway, SourceQuery, SourceRegistry};
pub use retry::{RetryConfig, RetryStrategy};
pub use service::ScreeningService;
pub use source::{HttpConfig, HttpSource, ListSource};
pub use worker::CancelToken;
