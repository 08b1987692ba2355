//! Entity resolution and candidate matching for compliance screening
//!
//! Expands a subject name into a bounded set of comparison variants,
//! normalizes candidate records returned by external data sources, and
//! filters/deduplicates them into per-category match lists.

#![forbid(unsafe_code)]

pub mod error;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod types;

pub use error::{Error, Result};
pub use matcher::{MatchConfig, MatchEngine, VariantCandidates};
pub use resolver::EntityResolver;
pub use types::{
    CandidateRecord, Category, CategoryMatches, MatchReport, NameVariant, PepRole, ScoredMatch,
    Subject, SubjectKind,
};
