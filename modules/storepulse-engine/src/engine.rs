use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use insight_client::InsightTransport;
use storepulse_common::{ConsensusResult, StorePulseError};

use crate::aggregator::aggregate;
use crate::consensus::synthesize;
use crate::fetcher::{FetchOutcome, SentimentFetcher};
use crate::traits::CatalogStore;

/// Local buyer sentiment refreshes daily.
const LOCAL_CACHE_DAYS: i64 = 1;
/// External web sentiment refreshes weekly.
const EXTERNAL_CACHE_DAYS: i64 = 7;

/// The consensus engine: freshness policy, refresh orchestration, and
/// verdict synthesis behind a single entry point.
///
/// Constructed with an injected store and transport so nothing in here
/// depends on process-global state. `transport: None` means no Insight
/// credential is configured; external refresh then fails open (assume
/// the title exists, never fabricate a score).
pub struct ConsensusEngine {
    store: Arc<dyn CatalogStore>,
    transport: Option<Arc<dyn InsightTransport>>,
    /// Item ids with an external refresh currently in flight. Contending
    /// callers are served the last-known cached state instead of issuing
    /// a duplicate external call.
    refresh_claims: Mutex<HashSet<Uuid>>,
}

impl ConsensusEngine {
    pub fn new(store: Arc<dyn CatalogStore>, transport: Option<Arc<dyn InsightTransport>>) -> Self {
        Self {
            store,
            transport,
            refresh_claims: Mutex::new(HashSet::new()),
        }
    }

    /// Produce the consensus payload for an item, refreshing each data
    /// source independently when its cache window has lapsed.
    ///
    /// All computation happens before the single persistence write, so a
    /// failure part-way leaves the previously cached state intact.
    pub async fn consensus(
        &self,
        item_id: Uuid,
        force_refresh: bool,
    ) -> Result<ConsensusResult, StorePulseError> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(StorePulseError::ItemNotFound(item_id))?;

        let now = Utc::now();

        let needs_local = force_refresh
            || item
                .local_synced_at
                .map_or(true, |at| now - at > Duration::days(LOCAL_CACHE_DAYS));
        let needs_external = force_refresh
            || item
                .external_synced_at
                .map_or(true, |at| now - at > Duration::days(EXTERNAL_CACHE_DAYS));

        let reviews = self.store.get_reviews(item_id).await?;
        let agg = aggregate(&reviews);

        let (review_count, average_rating) = if needs_local {
            if let Some(score) = agg.score {
                item.local_score = Some(score);
                item.local_synced_at = Some(now);
            }
            (agg.count, agg.average_rating)
        } else {
            // Serve the cached score; derive the displayed star average
            // from it so the two never disagree.
            let cached_avg = item.local_score.map(|s| s / 100.0 * 5.0).unwrap_or(0.0);
            (agg.count, cached_avg)
        };

        if needs_external {
            self.refresh_external(&mut item, now).await;
        }

        let result = synthesize(&item, review_count, average_rating);
        item.verdict = Some(result.verdict.clone());

        self.store.save_item(&item).await?;

        Ok(result)
    }

    async fn refresh_external(
        &self,
        item: &mut storepulse_common::CatalogItem,
        now: chrono::DateTime<Utc>,
    ) {
        let Some(transport) = &self.transport else {
            // No credential configured. Assume external existence, leave
            // scores and the sync stamp alone so a later-deployed
            // credential takes effect on the next stale read.
            warn!(title = item.title.as_str(), "Insight not configured, failing open");
            item.exists_externally = true;
            return;
        };

        if !self.try_claim(item.id) {
            info!(
                item_id = %item.id,
                "External refresh already in flight, serving cached state"
            );
            return;
        }

        let outcome = SentimentFetcher::new(transport.as_ref())
            .fetch(&item.title)
            .await;
        self.release_claim(item.id);

        match outcome {
            FetchOutcome::Fetched(data) => {
                item.global_score = data.score;
                item.external_sources = data.sources;
                item.exists_externally = true;
                item.external_synced_at = Some(now);
            }
            FetchOutcome::NoData => {
                // Confirmed negative result: cacheable for the full window.
                item.global_score = None;
                item.external_sources.clear();
                item.exists_externally = false;
                item.external_synced_at = Some(now);
            }
            FetchOutcome::TransientFailure => {
                // Leave everything untouched, including the sync stamp,
                // so the next request retries instead of serving a
                // failure as if it were cached.
                warn!(
                    title = item.title.as_str(),
                    "External sentiment unavailable, keeping prior state"
                );
            }
        }
    }

    fn try_claim(&self, id: Uuid) -> bool {
        self.refresh_claims
            .lock()
            .expect("refresh claim set poisoned")
            .insert(id)
    }

    fn release_claim(&self, id: Uuid) {
        self.refresh_claims
            .lock()
            .expect("refresh claim set poisoned")
            .remove(&id);
    }
}
