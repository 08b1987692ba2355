//! Source gateway contract
//!
//! A gateway answers one category's query for one name variant. Sources are
//! external and unreliable: every error is classified as transient (worth a
//! bounded retry) or permanent (fail the call immediately), and a failed
//! call degrades to zero hits for that variant rather than failing the job.

use async_trait::async_trait;
use chrono::NaiveDate;
use match_engine::{CandidateRecord, Category, Subject};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Query sent to a source gateway
#[derive(Debug, Clone)]
pub struct SourceQuery {
    /// Name variant to search for
    pub query_name: String,

    /// ISO 3166 country hint
    pub country: Option<String>,

    /// Subject date of birth, when known
    pub date_of_birth: Option<NaiveDate>,
}

impl SourceQuery {
    /// Build a query for one variant of a subject
    pub fn for_variant(subject: &Subject, variant_text: &str) -> Self {
        Self {
            query_name: variant_text.to_string(),
            country: subject.country.clone(),
            date_of_birth: subject.date_of_birth,
        }
    }
}

/// Typed failure of a source call
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Call exceeded its deadline
    #[error("Source timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream asked us to back off (HTTP 429)
    #[error("Source rate limited")]
    RateLimited,

    /// Upstream returned an error status
    #[error("Upstream error: status {0}")]
    UpstreamStatus(u16),

    /// Network-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream payload could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Gateway is missing required configuration
    #[error("Source not configured: {0}")]
    NotConfigured(String),
}

impl SourceError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout(_) | SourceError::RateLimited | SourceError::Transport(_) => true,
            SourceError::UpstreamStatus(status) => *status >= 500,
            SourceError::InvalidResponse(_) | SourceError::NotConfigured(_) => false,
        }
    }
}

/// Per-category compliance data source
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Fetch raw candidate records for one category and one name variant
    async fn fetch(
        &self,
        category: Category,
        query: &SourceQuery,
    ) -> std::result::Result<Vec<CandidateRecord>, SourceError>;
}

/// Maps each category to the gateway that serves it
pub struct SourceRegistry {
    gateways: HashMap<Category, Arc<dyn SourceGateway>>,
}

impl SourceRegistry {
    /// Serve every category from one gateway
    pub fn single(gateway: Arc<dyn SourceGateway>) -> Self {
        let mut gateways = HashMap::new();
        for category in Category::ALL {
            gateways.insert(category, Arc::clone(&gateway));
        }
        Self { gateways }
    }

    /// Override the gateway for one category
    pub fn with(mut self, category: Category, gateway: Arc<dyn SourceGateway>) -> Self {
        self.gateways.insert(category, gateway);
        self
    }

    /// Gateway for a category, if one is registered
    pub fn get(&self, category: Category) -> Option<Arc<dyn SourceGateway>> {
        self.gateways.get(&category).map(Arc::clone)
    }
}
