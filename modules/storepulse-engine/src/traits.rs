// Trait abstraction for the engine's persistence dependency.
//
// CatalogStore covers the three collaborator calls the engine needs:
// item lookup, item save, and review listing. The engine never mutates
// reviews and never touches catalog fields outside the sentiment set.
//
// This enables deterministic testing with MemoryCatalog: no network,
// no database.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use storepulse_common::{CatalogItem, ReviewRecord};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load a catalog item by id.
    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>>;

    /// Persist the sentiment fields of a catalog item.
    async fn save_item(&self, item: &CatalogItem) -> Result<()>;

    /// List all buyer reviews for a catalog item.
    async fn get_reviews(&self, item_id: Uuid) -> Result<Vec<ReviewRecord>>;
}
