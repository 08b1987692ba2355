//! Candidate scoring, relevance filtering and deduplication
//!
//! Organizations accept on exact canonical equality only: a fuzzy false
//! positive carries compliance cost, so near-matches are rejected outright.
//! Individuals accept on last-name token presence, plus first-name presence
//! in the same name string when the query supplies one.

use crate::error::{Error, Result};
use crate::normalize::{canonical_targets, canonicalize};
use crate::types::{
    CandidateRecord, Category, MatchReport, NameVariant, PepRole, ScoredMatch, Subject,
    SubjectKind,
};
use std::collections::HashSet;
use strsim::jaro_winkler;
use tracing::{debug, warn};

/// Match engine configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MatchConfig {
    /// Maximum records retained per category after filtering
    pub category_cap: usize,

    /// Reject matches whose country data is disjoint from the subject's
    pub enforce_country_filter: bool,

    /// Drop relative/close-associate PEP records when screening organizations
    pub exclude_pep_relatives_for_orgs: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            category_cap: 10,
            enforce_country_filter: true,
            exclude_pep_relatives_for_orgs: true,
        }
    }
}

/// Candidate records fetched for one name variant
#[derive(Debug, Clone)]
pub struct VariantCandidates {
    /// The variant that was queried
    pub variant: NameVariant,
    /// Raw records the sources returned for it
    pub records: Vec<CandidateRecord>,
}

/// Scores and filters source candidates against a subject
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: MatchConfig) -> Result<Self> {
        if config.category_cap == 0 {
            return Err(Error::Config(
                "category_cap must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Engine with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: MatchConfig::default(),
        }
    }

    /// Score one record against the variant that surfaced it
    pub fn score_record(
        &self,
        subject: &Subject,
        variant: &NameVariant,
        record: &CandidateRecord,
    ) -> ScoredMatch {
        let variant_canonical = canonicalize(&variant.text);
        let relevant = self.is_relevant(subject, &variant.text, record);
        let similarity = jaro_winkler(&variant_canonical, &canonicalize(&record.name));

        ScoredMatch {
            record: record.clone(),
            matched_variant: variant.text.clone(),
            similarity,
            relevant,
        }
    }

    /// Merge, filter and deduplicate all candidates fetched for one subject.
    ///
    /// Batches are processed in variant priority order so the first variant
    /// to surface a record wins; duplicates are keyed by the record's
    /// canonical name and source id within a category.
    pub fn evaluate(&self, subject: &Subject, batches: &[VariantCandidates]) -> MatchReport {
        let mut ordered: Vec<&VariantCandidates> = batches.iter().collect();
        ordered.sort_by_key(|b| b.variant.rank);

        let mut report = MatchReport::default();
        let mut seen: HashSet<(Category, String, String)> = HashSet::new();

        for batch in ordered {
            for record in &batch.records {
                if record.name.trim().is_empty() || record.source_id.trim().is_empty() {
                    warn!(
                        "Dropping malformed candidate from source '{}' (missing name or id)",
                        record.source_id
                    );
                    continue;
                }

                if self.config.exclude_pep_relatives_for_orgs
                    && subject.kind == SubjectKind::Organization
                    && record.category == Category::Pep
                    && record.pep_role == Some(PepRole::RelativeOrCloseAssociate)
                {
                    continue;
                }

                let key = (
                    record.category,
                    canonicalize(&record.name),
                    record.source_id.clone(),
                );
                if seen.contains(&key) {
                    continue;
                }

                let scored = self.score_record(subject, &batch.variant, record);
                if !scored.relevant {
                    continue;
                }

                seen.insert(key);
                report.category_mut(record.category).records.push(scored);
            }
        }

        for category in Category::ALL {
            let matches = report.category_mut(category);
            matches.records.truncate(self.config.category_cap);
            matches.total_hits = matches.records.len();
        }

        debug!(
            "Matched {} candidates for '{}' across {} variants",
            report.total_hits(),
            subject.name,
            batches.len()
        );

        report
    }

    fn is_relevant(&self, subject: &Subject, variant_text: &str, record: &CandidateRecord) -> bool {
        let name_matches = match subject.kind {
            SubjectKind::Organization => organization_match(variant_text, record),
            SubjectKind::Individual => individual_match(variant_text, record),
        };
        if !name_matches {
            return false;
        }

        if self.config.enforce_country_filter {
            // skipped when either side lacks country data
            if let Some(country) = subject.country.as_deref().filter(|c| !c.is_empty()) {
                if !record.countries.is_empty() {
                    let wanted = country.to_uppercase();
                    let overlaps = record
                        .countries
                        .iter()
                        .any(|c| c.to_uppercase() == wanted);
                    if !overlaps {
                        return false;
                    }
                }
            }
        }

        true
    }
}

// Exact canonical equality against any of the record's names, with both the
// full and the suffix-stripped form of each side as valid targets.
fn organization_match(query: &str, record: &CandidateRecord) -> bool {
    let q = canonical_targets(query);

    record_names(record).any(|name| {
        let c = canonical_targets(name);
        q.full == c.full || q.full == c.stripped || q.stripped == c.full || q.stripped == c.stripped
    })
}

// Last-name token must appear in the candidate name; when the query has a
// first-name token it must appear in the same name string.
fn individual_match(query: &str, record: &CandidateRecord) -> bool {
    let canonical = canonicalize(query);
    let tokens: Vec<&str> = canonical.split_whitespace().collect();

    let Some(last) = tokens.last().copied() else {
        return false;
    };
    let first = if tokens.len() >= 2 {
        Some(tokens[0])
    } else {
        None
    };

    record_names(record).any(|name| {
        let candidate = canonicalize(name);
        let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
        if !candidate_tokens.contains(&last) {
            return false;
        }
        match first {
            Some(first) => candidate_tokens.contains(&first),
            None => true,
        }
    })
}

fn record_names(record: &CandidateRecord) -> impl Iterator<Item = &str> {
    std::iter::once(record.name.as_str()).chain(record.alias_names.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn org(name: &str) -> Subject {
        Subject::new(name, SubjectKind::Organization).unwrap()
    }

    fn person(name: &str) -> Subject {
        Subject::new(name, SubjectKind::Individual).unwrap()
    }

    fn record(name: &str, category: Category, source_id: &str) -> CandidateRecord {
        CandidateRecord {
            name: name.to_string(),
            alias_names: vec![],
            countries: vec![],
            category,
            source_id: source_id.to_string(),
            pep_role: None,
            raw: json!({}),
        }
    }

    fn batch(variant: &str, rank: usize, records: Vec<CandidateRecord>) -> VariantCandidates {
        VariantCandidates {
            variant: NameVariant::new(variant, rank),
            records,
        }
    }

    #[test]
    fn test_organization_exact_only() {
        let engine = MatchEngine::with_defaults();
        let subject = org("Acme Corporation");

        let report = engine.evaluate(
            &subject,
            &[batch(
                "Acme Corporation",
                0,
                vec![
                    record("Acme Corp", Category::Sanction, "OFAC-1"),
                    record("Acme Industries", Category::Sanction, "OFAC-2"),
                ],
            )],
        );

        assert_eq!(report.sanctions.total_hits, 1);
        assert_eq!(report.sanctions.records[0].record.name, "Acme Corp");
    }

    #[test]
    fn test_organization_alias_match() {
        let engine = MatchEngine::with_defaults();
        let subject = org("Globex GmbH");

        let mut hit = record("Completely Different SA", Category::Sanction, "EU-9");
        hit.alias_names = vec!["Globex".to_string()];

        let report = engine.evaluate(&subject, &[batch("Globex GmbH", 0, vec![hit])]);
        assert_eq!(report.sanctions.total_hits, 1);
    }

    #[test]
    fn test_individual_requires_last_name() {
        let engine = MatchEngine::with_defaults();
        let subject = person("Smith");

        let report = engine.evaluate(
            &subject,
            &[batch(
                "Smith",
                0,
                vec![
                    record("John A. Smith", Category::Criminal, "CR-1"),
                    record("John Jones", Category::Criminal, "CR-2"),
                ],
            )],
        );

        assert_eq!(report.criminal.total_hits, 1);
        assert_eq!(report.criminal.records[0].record.name, "John A. Smith");
    }

    #[test]
    fn test_individual_first_name_must_co_occur() {
        let engine = MatchEngine::with_defaults();
        let subject = person("Jane Smith");

        let report = engine.evaluate(
            &subject,
            &[batch(
                "Jane Smith",
                0,
                vec![
                    record("Jane Smith", Category::Pep, "PEP-1"),
                    // last name present, first name missing
                    record("John Smith", Category::Pep, "PEP-2"),
                ],
            )],
        );

        assert_eq!(report.pep.total_hits, 1);
        assert_eq!(report.pep.records[0].record.source_id, "PEP-1");
    }

    #[test]
    fn test_country_filter_disjoint_rejects() {
        let engine = MatchEngine::with_defaults();
        let subject = person("Jane Smith").with_country("GB");

        let mut foreign = record("Jane Smith", Category::Pep, "PEP-1");
        foreign.countries = vec!["RU".to_string()];
        let mut domestic = record("Jane Smith", Category::Pep, "PEP-2");
        domestic.countries = vec!["gb".to_string(), "FR".to_string()];
        // record without country data bypasses the filter
        let unknown = record("Jane Smith", Category::Pep, "PEP-3");

        let report = engine.evaluate(
            &subject,
            &[batch("Jane Smith", 0, vec![foreign, domestic, unknown])],
        );

        let ids: Vec<&str> = report
            .pep
            .records
            .iter()
            .map(|m| m.record.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["PEP-2", "PEP-3"]);
    }

    #[test]
    fn test_pep_relatives_excluded_for_organizations() {
        let engine = MatchEngine::with_defaults();

        let mut relative = record("Acme", Category::Pep, "PEP-1");
        relative.pep_role = Some(PepRole::RelativeOrCloseAssociate);
        let mut principal = record("Acme", Category::Pep, "PEP-2");
        principal.pep_role = Some(PepRole::Principal);

        let report = engine.evaluate(
            &org("Acme Inc"),
            &[batch("Acme Inc", 0, vec![relative.clone(), principal])],
        );
        assert_eq!(report.pep.total_hits, 1);
        assert_eq!(report.pep.records[0].record.source_id, "PEP-2");

        // same record is kept when screening an individual
        relative.name = "Ali Acme".to_string();
        let report = engine.evaluate(
            &person("Ali Acme"),
            &[batch("Ali Acme", 0, vec![relative])],
        );
        assert_eq!(report.pep.total_hits, 1);
    }

    #[test]
    fn test_dedup_across_variants_first_found_wins() {
        let engine = MatchEngine::with_defaults();
        let subject = person("Maria Al-Otaibi");

        let hit = record("Maria Otaibi", Category::Sanction, "OFAC-7");

        let report = engine.evaluate(
            &subject,
            &[
                batch("Maria Otaibi", 2, vec![hit.clone()]),
                batch("Otaibi Maria", 3, vec![hit]),
            ],
        );

        assert_eq!(report.sanctions.total_hits, 1);
        assert_eq!(report.sanctions.records[0].matched_variant, "Maria Otaibi");
    }

    #[test]
    fn test_category_cap_applied() {
        let engine = MatchEngine::new(MatchConfig {
            category_cap: 2,
            ..MatchConfig::default()
        })
        .unwrap();

        let records: Vec<CandidateRecord> = (0..5)
            .map(|i| record("Jane Smith", Category::Other, &format!("SRC-{}", i)))
            .collect();

        let report = engine.evaluate(&person("Jane Smith"), &[batch("Jane Smith", 0, records)]);
        assert_eq!(report.other.total_hits, 2);
        assert_eq!(report.other.records.len(), 2);
    }

    #[test]
    fn test_malformed_record_dropped() {
        let engine = MatchEngine::with_defaults();
        let report = engine.evaluate(
            &person("Jane Smith"),
            &[batch(
                "Jane Smith",
                0,
                vec![
                    record("", Category::Sanction, "OFAC-1"),
                    record("Jane Smith", Category::Sanction, ""),
                    record("Jane Smith", Category::Sanction, "OFAC-2"),
                ],
            )],
        );
        assert_eq!(report.sanctions.total_hits, 1);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let result = MatchEngine::new(MatchConfig {
            category_cap: 0,
            ..MatchConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_similarity_reported() {
        let engine = MatchEngine::with_defaults();
        let subject = person("Jane Smith");
        let scored = engine.score_record(
            &subject,
            &NameVariant::new("Jane Smith", 0),
            &record("Jane Smith", Category::Pep, "PEP-1"),
        );
        assert!(scored.relevant);
        assert!((scored.similarity - 1.0).abs() < f64::EPSILON);
    }
}
