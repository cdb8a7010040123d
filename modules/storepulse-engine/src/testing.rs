//! In-memory test doubles for the engine's two injected dependencies.
//! No network, no database.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use insight_client::{InsightError, InsightTransport};
use storepulse_common::{CatalogItem, ReviewRecord};

use crate::traits::CatalogStore;

// ---------------------------------------------------------------------------
// MemoryCatalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCatalog {
    items: Mutex<HashMap<Uuid, CatalogItem>>,
    reviews: Mutex<HashMap<Uuid, Vec<ReviewRecord>>>,
    saves: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&self, item: CatalogItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn insert_reviews(&self, item_id: Uuid, reviews: Vec<ReviewRecord>) {
        self.reviews.lock().unwrap().insert(item_id, reviews);
    }

    /// Snapshot of the persisted item state.
    pub fn item(&self, id: Uuid) -> Option<CatalogItem> {
        self.items.lock().unwrap().get(&id).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn save_item(&self, item: &CatalogItem) -> Result<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.items.lock().unwrap().insert(item.id, item.clone());
        Ok(())
    }

    async fn get_reviews(&self, item_id: Uuid) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// ScriptedInsight
// ---------------------------------------------------------------------------

/// Transport that plays back a fixed script of replies in order.
/// Calling past the end of the script fails the test loudly, which also
/// makes "no further external call happened" assertable via `call_count`.
pub struct ScriptedInsight {
    script: Mutex<VecDeque<Result<String, InsightError>>>,
    calls: AtomicUsize,
}

impl ScriptedInsight {
    pub fn replies(script: Vec<Result<String, InsightError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl InsightTransport for ScriptedInsight {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String, InsightError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedInsight: script exhausted"))
    }
}

// ---------------------------------------------------------------------------
// Canned replies
// ---------------------------------------------------------------------------

pub fn exists_reply() -> Result<String, InsightError> {
    Ok(r#"{"exists": true, "sources_found": ["IGN"]}"#.to_string())
}

pub fn not_found_reply() -> Result<String, InsightError> {
    Ok(r#"{"exists": false, "sources_found": []}"#.to_string())
}

pub fn sentiment_reply(score: f64) -> Result<String, InsightError> {
    Ok(format!(
        r#"{{"overall_sentiment_score": {score}, "sources": [
            {{"source_name": "IGN", "url": "https://www.ign.com/reviews/example", "sentiment": "Positive", "score": {score}}},
            {{"source_name": "Metacritic", "url": "https://www.metacritic.com/game/example", "sentiment": "Mixed", "score": {score}}}
        ], "summary": "Canned summary"}}"#
    ))
}
