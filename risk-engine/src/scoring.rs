//! Risk scoring
//!
//! Presence is binary per category: a category contributes its weight once
//! when it has any hits, regardless of count. Every screened entity carries a
//! baseline score even with zero hits.

use crate::error::{Error, Result};
use crate::types::{CategoryHits, RiskAssessment, RiskLevel, RiskScore};
use chrono::Utc;
use tracing::debug;

/// Score weights and level thresholds
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RiskWeights {
    /// Baseline score applied to every subject
    pub base: u8,

    /// Weight added when any sanctions hit exists
    pub sanctions: u8,

    /// Weight added when any PEP hit exists
    pub pep: u8,

    /// Weight added when any criminal hit exists
    pub criminal: u8,

    /// Weight added when any adverse-information hit exists
    pub other: u8,

    /// Adverse-information count at or above which the level escalates to
    /// High even without sanctions/criminal hits
    pub other_high_threshold: usize,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            base: 10,
            sanctions: 50,
            pep: 25,
            criminal: 20,
            other: 10,
            other_high_threshold: 5,
        }
    }
}

/// Aggregates categorized hit counts into a risk assessment
#[derive(Debug, Clone)]
pub struct RiskAggregator {
    weights: RiskWeights,
}

impl RiskAggregator {
    /// Create an aggregator, validating the weights.
    ///
    /// Thresholds must stay monotonic: more or worse hits may never lower
    /// the level, and sanctions must outweigh pep, pep outweigh criminal.
    pub fn new(weights: RiskWeights) -> Result<Self> {
        if weights.other_high_threshold == 0 {
            return Err(Error::Config(
                "other_high_threshold must be at least 1".to_string(),
            ));
        }
        if weights.sanctions < weights.pep || weights.pep < weights.criminal {
            return Err(Error::Config(
                "category weights must be ordered sanctions >= pep >= criminal".to_string(),
            ));
        }
        Ok(Self { weights })
    }

    /// Aggregator with default weights
    pub fn with_defaults() -> Self {
        Self {
            weights: RiskWeights::default(),
        }
    }

    /// Assess one subject's categorized hit counts
    pub fn assess(&self, hits: &CategoryHits) -> RiskAssessment {
        let mut score = u32::from(self.weights.base);
        let mut factors = Vec::new();

        if hits.sanctions > 0 {
            score += u32::from(self.weights.sanctions);
            factors.push(format!("Sanctions listed ({} hits)", hits.sanctions));
        }
        if hits.pep > 0 {
            score += u32::from(self.weights.pep);
            factors.push(format!("PEP status ({} hits)", hits.pep));
        }
        if hits.criminal > 0 {
            score += u32::from(self.weights.criminal);
            factors.push(format!("Criminal records ({} hits)", hits.criminal));
        }
        if hits.other > 0 {
            score += u32::from(self.weights.other);
            factors.push(format!("Adverse information ({} hits)", hits.other));
        }

        let score = RiskScore::new(score.min(100) as u8);
        let level = self.level_for(hits);

        debug!(
            "Risk assessment: score={} level={} from {} total hits",
            score,
            level,
            hits.total()
        );

        RiskAssessment {
            hits: *hits,
            score,
            level,
            factors,
            assessed_at: Utc::now(),
        }
    }

    fn level_for(&self, hits: &CategoryHits) -> RiskLevel {
        if hits.sanctions > 0 || hits.criminal > 0 || hits.other >= self.weights.other_high_threshold
        {
            RiskLevel::High
        } else if hits.pep > 0 || hits.other > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for RiskAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hits(sanctions: usize, pep: usize, criminal: usize, other: usize) -> CategoryHits {
        CategoryHits {
            sanctions,
            pep,
            criminal,
            other,
        }
    }

    #[test]
    fn test_clean_subject_is_low_with_baseline() {
        let assessment = RiskAggregator::with_defaults().assess(&hits(0, 0, 0, 0));
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.score.value(), 10);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_sanctions_hit_is_high() {
        let aggregator = RiskAggregator::with_defaults();
        let clean = aggregator.assess(&hits(0, 0, 0, 0));
        let flagged = aggregator.assess(&hits(1, 0, 0, 0));

        assert_eq!(flagged.level, RiskLevel::High);
        assert!(flagged.score.value() >= 60);
        assert!(flagged.score >= clean.score);
    }

    #[test]
    fn test_presence_is_binary_per_category() {
        let aggregator = RiskAggregator::with_defaults();
        let one = aggregator.assess(&hits(1, 0, 0, 0));
        let many = aggregator.assess(&hits(9, 0, 0, 0));
        assert_eq!(one.score, many.score);
    }

    #[test]
    fn test_pep_only_is_medium() {
        let assessment = RiskAggregator::with_defaults().assess(&hits(0, 2, 0, 0));
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(assessment.score.value(), 35);
    }

    #[test]
    fn test_criminal_is_high() {
        let assessment = RiskAggregator::with_defaults().assess(&hits(0, 0, 1, 0));
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn test_small_adverse_count_is_medium_large_is_high() {
        let aggregator = RiskAggregator::with_defaults();
        assert_eq!(aggregator.assess(&hits(0, 0, 0, 2)).level, RiskLevel::Medium);
        assert_eq!(aggregator.assess(&hits(0, 0, 0, 8)).level, RiskLevel::High);
    }

    #[test]
    fn test_factor_order_is_deterministic() {
        let assessment = RiskAggregator::with_defaults().assess(&hits(1, 1, 1, 1));
        assert_eq!(assessment.factors.len(), 4);
        assert!(assessment.factors[0].starts_with("Sanctions"));
        assert!(assessment.factors[1].starts_with("PEP"));
        assert!(assessment.factors[2].starts_with("Criminal"));
        assert!(assessment.factors[3].starts_with("Adverse"));
    }

    #[test]
    fn test_score_capped_at_100() {
        let weights = RiskWeights {
            base: 40,
            sanctions: 60,
            pep: 50,
            criminal: 40,
            other: 30,
            other_high_threshold: 5,
        };
        let assessment = RiskAggregator::new(weights).unwrap().assess(&hits(1, 1, 1, 1));
        assert_eq!(assessment.score.value(), 100);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let unordered = RiskWeights {
            sanctions: 10,
            pep: 25,
            ..RiskWeights::default()
        };
        assert!(RiskAggregator::new(unordered).is_err());

        let zero_threshold = RiskWeights {
            other_high_threshold: 0,
            ..RiskWeights::default()
        };
        assert!(RiskAggregator::new(zero_threshold).is_err());
    }

    proptest! {
        // adding hits to any category never lowers score or level
        #[test]
        fn prop_monotonic_in_every_category(
            s in 0usize..4, p in 0usize..4, c in 0usize..4, o in 0usize..8,
            ds in 0usize..4, dp in 0usize..4, dc in 0usize..4, dx in 0usize..8,
        ) {
            let aggregator = RiskAggregator::with_defaults();
            let base = aggregator.assess(&hits(s, p, c, o));
            let more = aggregator.assess(&hits(s + ds, p + dp, c + dc, o + dx));

            prop_assert!(more.score >= base.score);
            prop_assert!(more.level >= base.level);
        }

        // factors are reproducible from hit counts alone
        #[test]
        fn prop_factors_deterministic(s in 0usize..3, p in 0usize..3, c in 0usize..3, o in 0usize..3) {
            let aggregator = RiskAggregator::with_defaults();
            let a = aggregator.assess(&hits(s, p, c, o));
            let b = aggregator.assess(&hits(s, p, c, o));
            prop_assert_eq!(a.factors, b.factors);
            prop_assert_eq!(a.score, b.score);
            prop_assert_eq!(a.level, b.level);
        }
    }
}
