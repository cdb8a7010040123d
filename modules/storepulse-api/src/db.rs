use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use storepulse_common::{CatalogItem, ReviewRecord, SourceCitation};
use storepulse_engine::CatalogStore;

type ItemRow = (
    Uuid,
    String,
    Option<f64>,
    Option<f64>,
    bool,
    serde_json::Value,
    Option<String>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

/// Postgres-backed catalog store. Citations are stored as a JSONB array
/// on the item row; a citation that fails to decode is dropped rather
/// than failing the whole read.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, title, local_score, global_score, exists_externally,
                   external_sources, verdict, local_synced_at, external_synced_at
            FROM catalog_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_item))
    }

    async fn save_item(&self, item: &CatalogItem) -> Result<()> {
        let sources = serde_json::to_value(&item.external_sources)?;

        sqlx::query(
            r#"
            UPDATE catalog_items
            SET local_score = $2,
                global_score = $3,
                exists_externally = $4,
                external_sources = $5,
                verdict = $6,
                local_synced_at = $7,
                external_synced_at = $8
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(item.local_score)
        .bind(item.global_score)
        .bind(item.exists_externally)
        .bind(sources)
        .bind(&item.verdict)
        .bind(item.local_synced_at)
        .bind(item.external_synced_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_reviews(&self, item_id: Uuid) -> Result<Vec<ReviewRecord>> {
        let rows = sqlx::query_as::<_, (i16, String)>(
            r#"
            SELECT rating, body
            FROM reviews
            WHERE item_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(rating, text)| ReviewRecord {
                rating: rating.clamp(1, 5) as u8,
                text,
            })
            .collect())
    }
}

fn row_to_item(r: ItemRow) -> CatalogItem {
    let sources: Vec<SourceCitation> = serde_json::from_value::<Vec<serde_json::Value>>(r.5)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    CatalogItem {
        id: r.0,
        title: r.1,
        local_score: r.2,
        global_score: r.3,
        exists_externally: r.4,
        external_sources: sources,
        verdict: r.6,
        local_synced_at: r.7,
        external_synced_at: r.8,
    }
}
