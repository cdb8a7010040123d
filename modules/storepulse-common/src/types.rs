use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Catalog ---

/// Subset of a catalog item the consensus engine reads and writes.
/// The surrounding storefront owns the record; the engine only touches
/// the sentiment fields below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub title: String,
    pub local_score: Option<f64>,
    pub global_score: Option<f64>,
    pub exists_externally: bool,
    pub external_sources: Vec<SourceCitation>,
    pub verdict: Option<String>,
    pub local_synced_at: Option<DateTime<Utc>>,
    pub external_synced_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    /// A fresh item with all sentiment fields unset.
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            local_score: None,
            global_score: None,
            exists_externally: false,
            external_sources: Vec::new(),
            verdict: None,
            local_synced_at: None,
            external_synced_at: None,
        }
    }
}

/// A cited external review source. Only citations with an http(s) URL
/// survive ingestion; the rest are dropped silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub name: String,
    pub url: String,
    pub sentiment_label: String,
    #[serde(default = "default_citation_score")]
    pub score: f64,
}

fn default_citation_score() -> f64 {
    50.0
}

/// A buyer review attached to a catalog item. Owned by the storefront's
/// review subsystem; the engine only aggregates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Star rating, 1..=5.
    pub rating: u8,
    pub text: String,
}

// --- Consensus output ---

/// The externally visible consensus payload. Ephemeral; the persisted
/// fields live on [`CatalogItem`].
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    pub local_score: Option<f64>,
    pub global_score: Option<f64>,
    pub divergence: Option<f64>,
    pub verdict: String,
    pub sources: Vec<SourceCitation>,
    pub local_review_count: usize,
    pub local_average_rating: f64,
    pub exists_externally: bool,
}
