//! Core types shared by the resolver and the match engine

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity being screened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    /// A natural person
    Individual,
    /// A company or other legal entity
    Organization,
}

/// The company or individual being screened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Raw name as supplied by the client
    pub name: String,

    /// Entity kind (drives the matching rules)
    pub kind: SubjectKind,

    /// ISO 3166 country hint
    pub country: Option<String>,

    /// Date of birth (individuals only)
    pub date_of_birth: Option<NaiveDate>,
}

impl Subject {
    /// Create a new subject, rejecting empty names
    pub fn new(name: impl Into<String>, kind: SubjectKind) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::EmptySubject);
        }
        Ok(Self {
            name,
            kind,
            country: None,
            date_of_birth: None,
        })
    }

    /// Attach a country hint
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Attach a date of birth
    pub fn with_date_of_birth(mut self, dob: NaiveDate) -> Self {
        self.date_of_birth = Some(dob);
        self
    }
}

/// Result category of a candidate record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Sanctions list entry
    Sanction,
    /// Politically exposed person
    Pep,
    /// Criminal record
    Criminal,
    /// Adverse information / everything else
    Other,
}

impl Category {
    /// All categories, in reporting order
    pub const ALL: [Category; 4] = [
        Category::Sanction,
        Category::Pep,
        Category::Criminal,
        Category::Other,
    ];

    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sanction => "sanction",
            Category::Pep => "pep",
            Category::Criminal => "criminal",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sanction" | "sanctions" => Ok(Category::Sanction),
            "pep" => Ok(Category::Pep),
            "criminal" => Ok(Category::Criminal),
            "other" | "adverse" | "adverse_media" => Ok(Category::Other),
            other => Err(Error::Config(format!("Unknown category '{}'", other))),
        }
    }
}

/// Relationship of a PEP record to the politically exposed person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PepRole {
    /// The exposed person themselves
    Principal,
    /// Family member or close associate of the exposed person
    RelativeOrCloseAssociate,
}

/// A raw hit returned by a compliance data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Primary name on the record
    pub name: String,

    /// Known aliases
    #[serde(default)]
    pub alias_names: Vec<String>,

    /// Country / citizenship codes attached to the record
    #[serde(default)]
    pub countries: Vec<String>,

    /// Which list category the record came from
    pub category: Category,

    /// Identifier of the upstream source list entry
    pub source_id: String,

    /// PEP relationship (PEP-category records only)
    #[serde(default)]
    pub pep_role: Option<PepRole>,

    /// Opaque upstream payload, passed through untouched
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// An alternate spelling/ordering of a subject name. Rank 0 is always the
/// original input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameVariant {
    /// Variant text
    pub text: String,
    /// Priority rank (lower tried first)
    pub rank: usize,
}

impl NameVariant {
    /// Create a variant
    pub fn new(text: impl Into<String>, rank: usize) -> Self {
        Self {
            text: text.into(),
            rank,
        }
    }
}

/// A candidate record together with its scoring outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// The source record
    pub record: CandidateRecord,

    /// The name variant that surfaced this record
    pub matched_variant: String,

    /// Informational Jaro-Winkler similarity between the variant and the
    /// record's primary name (0.0 - 1.0). Acceptance never depends on it.
    pub similarity: f64,

    /// Whether the record passed the relevance rules
    pub relevant: bool,
}

/// Filtered, deduplicated matches for one category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryMatches {
    /// Number of retained hits
    pub total_hits: usize,

    /// Retained records, in first-found-wins order
    pub records: Vec<ScoredMatch>,
}

/// Per-category screening outcome for one subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    /// Sanctions hits
    pub sanctions: CategoryMatches,
    /// PEP hits
    pub pep: CategoryMatches,
    /// Criminal-record hits
    pub criminal: CategoryMatches,
    /// Adverse-information hits
    pub other: CategoryMatches,
}

impl MatchReport {
    /// Matches for one category
    pub fn category(&self, category: Category) -> &CategoryMatches {
        match category {
            Category::Sanction => &self.sanctions,
            Category::Pep => &self.pep,
            Category::Criminal => &self.criminal,
            Category::Other => &self.other,
        }
    }

    pub(crate) fn category_mut(&mut self, category: Category) -> &mut CategoryMatches {
        match category {
            Category::Sanction => &mut self.sanctions,
            Category::Pep => &mut self.pep,
            Category::Criminal => &mut self.criminal,
            Category::Other => &mut self.other,
        }
    }

    /// Total hits across all categories
    pub fn total_hits(&self) -> usize {
        Category::ALL
            .iter()
            .map(|c| self.category(*c).total_hits)
            .sum()
    }
}
