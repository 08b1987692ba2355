//! In-memory list-backed source gateway
//!
//! Holds candidate record lists per category, loadable programmatically or
//! from CSV. Serves as the local-list deployment mode and as the test/demo
//! source; per-category failure injection lets tests exercise the partial
//! failure paths.

use crate::error::{Error, Result};
use crate::gateway::{SourceError, SourceGateway, SourceQuery};
use async_trait::async_trait;
use dashmap::DashMap;
use match_engine::{CandidateRecord, Category, PepRole};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// DashMap-backed source gateway over named record lists
#[derive(Default)]
pub struct ListSource {
    lists: DashMap<Category, Vec<CandidateRecord>>,
    failures: DashMap<Category, SourceError>,
}

#[derive(Debug, Deserialize)]
struct ListRow {
    name: String,
    #[serde(default)]
    aliases: String,
    #[serde(default)]
    countries: String,
    category: String,
    source_id: String,
    #[serde(default)]
    pep_role: String,
}

impl ListSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to a category list
    pub fn load_records(&self, category: Category, records: Vec<CandidateRecord>) {
        let count = records.len();
        self.lists.entry(category).or_default().extend(records);
        info!("Loaded {} records into {} list", count, category);
    }

    /// Load records from a CSV file with columns
    /// `name,aliases,countries,category,source_id,pep_role` (aliases and
    /// countries are `;`-separated, pep_role may be empty).
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to open list file: {}", e)))?;

        let mut loaded = 0;
        for row in reader.deserialize() {
            let row: ListRow =
                row.map_err(|e| Error::Config(format!("Malformed list row: {}", e)))?;
            let category = Category::from_str(&row.category)
                .map_err(|e| Error::Config(e.to_string()))?;

            let record = CandidateRecord {
                name: row.name,
                alias_names: split_list(&row.aliases),
                countries: split_list(&row.countries),
                category,
                source_id: row.source_id,
                pep_role: parse_pep_role(&row.pep_role),
                raw: serde_json::Value::Null,
            };
            self.lists.entry(category).or_default().push(record);
            loaded += 1;
        }

        info!("Loaded {} records from {:?}", loaded, path.as_ref());
        Ok(loaded)
    }

    /// Make every fetch for a category fail with the given error
    pub fn inject_failure(&self, category: Category, error: SourceError) {
        self.failures.insert(category, error);
    }

    /// Remove an injected failure
    pub fn clear_failure(&self, category: Category) {
        self.failures.remove(&category);
    }

    /// Total records across all lists
    pub fn total_records(&self) -> usize {
        self.lists.iter().map(|l| l.value().len()).sum()
    }
}

#[async_trait]
impl SourceGateway for ListSource {
    async fn fetch(
        &self,
        category: Category,
        query: &SourceQuery,
    ) -> std::result::Result<Vec<CandidateRecord>, SourceError> {
        if let Some(error) = self.failures.get(&category) {
            return Err(error.clone());
        }

        let needle = query.query_name.to_lowercase();
        let matches: Vec<CandidateRecord> = self
            .lists
            .get(&category)
            .map(|list| {
                list.iter()
                    .filter(|record| loose_match(&needle, record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "List source returned {} records for '{}' in {}",
            matches.len(),
            query.query_name,
            category
        );
        Ok(matches)
    }
}

// A remote source does its own broad recall; the list source mirrors that
// with case-insensitive containment in either direction.
fn loose_match(needle: &str, record: &CandidateRecord) -> bool {
    let name = record.name.to_lowercase();
    if name.contains(needle) || needle.contains(&name) {
        return true;
    }
    record.alias_names.iter().any(|alias| {
        let alias = alias.to_lowercase();
        alias.contains(needle) || needle.contains(&alias)
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_pep_role(raw: &str) -> Option<PepRole> {
    match raw.trim().to_lowercase().as_str() {
        "" => None,
        "principal" => Some(PepRole::Principal),
        _ if raw.to_lowercase().contains("relative") || raw.to_lowercase().contains("associate") => {
            Some(PepRole::RelativeOrCloseAssociate)
        }
        _ => Some(PepRole::Principal),
    }
}
