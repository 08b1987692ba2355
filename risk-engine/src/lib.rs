//! Risk aggregation for compliance screening
//!
//! Converts per-category hit counts into a numeric risk score, a categorical
//! risk level and a deterministic list of risk factors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod scoring;
pub mod types;

pub use error::{Error, Result};
pub use scoring::{RiskAggregator, RiskWeights};
pub use types::{CategoryHits, RiskAssessment, RiskLevel, RiskScore};
