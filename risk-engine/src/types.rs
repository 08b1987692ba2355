//! Core types for the risk engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Create new risk score, capped at 100
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Get raw score
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        write!(f, "{}", s)
    }
}

/// Per-category hit counts feeding the aggregator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHits {
    /// Sanctions hits
    pub sanctions: usize,

    /// PEP hits
    pub pep: usize,

    /// Criminal-record hits
    pub criminal: usize,

    /// Adverse-information hits
    pub other: usize,
}

impl CategoryHits {
    /// Total hits across all categories
    pub fn total(&self) -> usize {
        self.sanctions + self.pep + self.criminal + self.other
    }
}

/// Risk assessment result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Hit counts the assessment was derived from
    pub hits: CategoryHits,

    /// Risk score
    pub score: RiskScore,

    /// Risk level
    pub level: RiskLevel,

    /// Risk factors, ordered deterministically from the non-empty categories
    pub factors: Vec<String>,

    /// Assessment timestamp
    pub assessed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_capped_at_100() {
        assert_eq!(RiskScore::new(250).value(), 100);
        assert_eq!(RiskScore::new(60).value(), 60);
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_hits_total() {
        let hits = CategoryHits {
            sanctions: 1,
            pep: 2,
            criminal: 0,
            other: 3,
        };
        assert_eq!(hits.total(), 6);
    }
}
