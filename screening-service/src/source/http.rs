//! HTTP source gateway
//!
//! Speaks the upstream screening API shape: API-key header auth, name and
//! locale query parameters, a per-category `includes` selector, and a
//! `total_hits` / `found_records` JSON response.

use crate::gateway::{SourceError, SourceGateway, SourceQuery};
use async_trait::async_trait;
use match_engine::{CandidateRecord, Category, PepRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upstream base URL
    pub base_url: String,

    /// API key sent in the `x-api-key` header
    pub api_key: String,

    /// Per-request timeout
    pub timeout_ms: u64,

    /// Ask the upstream for fuzzy recall (filtering happens locally)
    pub fuzzy_search: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.example.com/v1".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
            fuzzy_search: true,
        }
    }
}

/// reqwest-backed source gateway
pub struct HttpSource {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpSource {
    /// Build a gateway, validating configuration
    pub fn new(config: HttpConfig) -> std::result::Result<Self, SourceError> {
        if config.api_key.is_empty() {
            return Err(SourceError::NotConfigured("missing API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SourceGateway for HttpSource {
    async fn fetch(
        &self,
        category: Category,
        query: &SourceQuery,
    ) -> std::result::Result<Vec<CandidateRecord>, SourceError> {
        let mut params: Vec<(&str, String)> = vec![
            ("names", query.query_name.clone()),
            ("includes", includes_for(category).to_string()),
        ];
        if self.config.fuzzy_search {
            params.push(("fuzzy_search", "1".to_string()));
        }
        if let Some(country) = &query.country {
            params.push(("country", country.clone()));
        }
        if let Some(dob) = query.date_of_birth {
            params.push(("dob", dob.format("%Y-%m-%d").to_string()));
        }

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let response = self
            .client
            .get(format!("{}/checkEntity", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(timeout)
                } else {
                    SourceError::Transport(e.to_string())
                }
            })?;

        match response.status().as_u16() {
            200 => {
                let body: WireResponse = response
                    .json()
                    .await
                    .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

                let records: Vec<CandidateRecord> = body
                    .found_records
                    .into_iter()
                    .filter_map(|value| convert_record(value, category))
                    .collect();

                debug!(
                    "Upstream returned {} usable records for '{}' in {}",
                    records.len(),
                    query.query_name,
                    category
                );
                Ok(records)
            }
            429 => Err(SourceError::RateLimited),
            status => Err(SourceError::UpstreamStatus(status)),
        }
    }
}

fn includes_for(category: Category) -> &'static str {
    match category {
        Category::Sanction => "sanctions",
        Category::Pep => "pep",
        Category::Criminal => "criminal",
        Category::Other => "adverse_media",
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    found_records: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    name: String,
    #[serde(default)]
    alias_names: Vec<String>,
    #[serde(default)]
    citizenship: Vec<String>,
    #[serde(default)]
    source_id: String,
    #[serde(default)]
    source_type: Option<String>,
    #[serde(default)]
    pep_type: Option<String>,
}

// Decode one upstream record, keeping the raw payload. Records missing
// required fields are dropped here rather than failing the whole response.
fn convert_record(value: serde_json::Value, requested: Category) -> Option<CandidateRecord> {
    let wire: WireRecord = match serde_json::from_value(value.clone()) {
        Ok(wire) => wire,
        Err(e) => {
            warn!("Dropping undecodable source record: {}", e);
            return None;
        }
    };
    if wire.name.trim().is_empty() || wire.source_id.trim().is_empty() {
        warn!("Dropping source record with missing name or id");
        return None;
    }

    // the upstream tags each record; fall back to the requested category
    let category = wire
        .source_type
        .as_deref()
        .and_then(|tag| tag.parse::<Category>().ok())
        .unwrap_or(requested);

    let pep_role = if category == Category::Pep {
        Some(pep_role_from_tag(wire.pep_type.as_deref()))
    } else {
        None
    };

    Some(CandidateRecord {
        name: wire.name,
        alias_names: wire.alias_names,
        countries: wire.citizenship,
        category,
        source_id: wire.source_id,
        pep_role,
        raw: value,
    })
}

fn pep_role_from_tag(tag: Option<&str>) -> PepRole {
    match tag {
        Some(tag)
            if tag.to_uppercase().contains("RELATIVE")
                || tag.to_uppercase().contains("ASSOCIATE") =>
        {
            PepRole::RelativeOrCloseAssociate
        }
        _ => PepRole::Principal,
    }
}
