//! End-to-end engine tests against in-memory doubles: freshness windows,
//! fail-open behavior, transient-failure retry, and cacheable negatives.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use insight_client::InsightError;
use storepulse_common::{CatalogItem, ReviewRecord};
use storepulse_engine::testing::{
    exists_reply, not_found_reply, sentiment_reply, MemoryCatalog, ScriptedInsight,
};
use storepulse_engine::ConsensusEngine;

fn reviews(ratings: &[u8]) -> Vec<ReviewRecord> {
    ratings
        .iter()
        .map(|&rating| ReviewRecord {
            rating,
            text: "fine".to_string(),
        })
        .collect()
}

fn seeded_store(id: Uuid, ratings: &[u8]) -> Arc<MemoryCatalog> {
    let store = Arc::new(MemoryCatalog::new());
    store.insert_item(CatalogItem::new(id, "Starfall"));
    store.insert_reviews(id, reviews(ratings));
    store
}

// ---------------------------------------------------------------------------
// Fail-open without a credential
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_credential_fails_open_without_fabricating_a_score() {
    let id = Uuid::new_v4();
    let store = seeded_store(id, &[5, 4, 5, 4]);
    let engine = ConsensusEngine::new(store.clone(), None);

    let result = engine.consensus(id, false).await.unwrap();

    assert!(result.exists_externally);
    assert_eq!(result.global_score, None);
    assert_eq!(result.local_score, Some(90.0));
    assert_eq!(result.local_average_rating, 4.5);
    assert!(result.verdict.contains("External data unavailable"));

    let saved = store.item(id).unwrap();
    assert!(saved.exists_externally);
    assert!(saved.global_score.is_none());
    // No sync stamp: a later-deployed credential takes effect immediately.
    assert!(saved.external_synced_at.is_none());
    assert!(saved.local_synced_at.is_some());
    assert_eq!(saved.verdict.as_deref(), Some(result.verdict.as_str()));
}

// ---------------------------------------------------------------------------
// Transient failures retry instead of caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_failure_leaves_state_untouched_and_retries_next_request() {
    let id = Uuid::new_v4();
    let store = seeded_store(id, &[5, 4, 5, 4]);
    let transport = Arc::new(ScriptedInsight::replies(vec![
        // First request: existence ok, then the sentiment call times out.
        exists_reply(),
        Err(InsightError::Timeout),
        // Second request: both calls succeed.
        exists_reply(),
        sentiment_reply(70.0),
    ]));
    let engine = ConsensusEngine::new(store.clone(), Some(transport.clone()));

    let first = engine.consensus(id, false).await.unwrap();
    assert_eq!(first.global_score, None);
    assert!(store.item(id).unwrap().external_synced_at.is_none());
    assert_eq!(transport.call_count(), 2);

    // Same process, non-forced: the failure was not cached, so this retries.
    let second = engine.consensus(id, false).await.unwrap();
    assert_eq!(transport.call_count(), 4);
    assert_eq!(second.global_score, Some(70.0));
    assert_eq!(second.divergence, Some(20.0));
    assert!(second.verdict.contains("MODERATE DIVERGENCE"));
    assert!(second
        .verdict
        .contains("Local buyers rate this title MORE FAVORABLY than web critics"));
    assert_eq!(second.sources.len(), 2);
    assert!(store.item(id).unwrap().external_synced_at.is_some());
}

// ---------------------------------------------------------------------------
// Confirmed "not found" is a cacheable negative
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirmed_not_found_is_cached_and_idempotent() {
    let id = Uuid::new_v4();
    let store = seeded_store(id, &[]);
    let transport = Arc::new(ScriptedInsight::replies(vec![not_found_reply()]));
    let engine = ConsensusEngine::new(store.clone(), Some(transport.clone()));

    let first = engine.consensus(id, false).await.unwrap();
    assert!(!first.exists_externally);
    assert_eq!(first.global_score, None);
    assert!(first.verdict.contains("No reviews yet."));
    assert!(first.verdict.contains("exclusive"));
    assert_eq!(transport.call_count(), 1);
    assert!(store.item(id).unwrap().external_synced_at.is_some());

    // Within the window: identical result, no further external calls.
    let second = engine.consensus(id, false).await.unwrap();
    assert_eq!(transport.call_count(), 1);
    assert_eq!(second.verdict, first.verdict);
    assert!(!second.exists_externally);
}

// ---------------------------------------------------------------------------
// Force refresh bypasses both windows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn force_refresh_recalls_the_external_service() {
    let id = Uuid::new_v4();
    let store = seeded_store(id, &[4, 4]);
    let transport = Arc::new(ScriptedInsight::replies(vec![
        exists_reply(),
        sentiment_reply(80.0),
        exists_reply(),
        sentiment_reply(60.0),
    ]));
    let engine = ConsensusEngine::new(store.clone(), Some(transport.clone()));

    let first = engine.consensus(id, false).await.unwrap();
    assert_eq!(first.global_score, Some(80.0));
    assert_eq!(transport.call_count(), 2);

    let forced = engine.consensus(id, true).await.unwrap();
    assert_eq!(transport.call_count(), 4);
    assert_eq!(forced.global_score, Some(60.0));
}

// ---------------------------------------------------------------------------
// Independent local window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_local_window_serves_the_cached_score() {
    let id = Uuid::new_v4();
    let store = Arc::new(MemoryCatalog::new());
    let mut item = CatalogItem::new(id, "Starfall");
    item.local_score = Some(40.0);
    item.local_synced_at = Some(Utc::now());
    // External already confirmed absent, well within its window.
    item.exists_externally = false;
    item.external_synced_at = Some(Utc::now());
    store.insert_item(item);
    store.insert_reviews(id, reviews(&[5, 5, 5]));

    let engine = ConsensusEngine::new(store.clone(), None);

    let cached = engine.consensus(id, false).await.unwrap();
    assert_eq!(cached.local_score, Some(40.0));
    // Displayed star average is derived from the cached score.
    assert_eq!(cached.local_average_rating, 2.0);
    assert_eq!(cached.local_review_count, 3);

    let forced = engine.consensus(id, true).await.unwrap();
    assert_eq!(forced.local_score, Some(100.0));
    assert_eq!(forced.local_average_rating, 5.0);
}

#[tokio::test]
async fn stale_local_window_recomputes_the_score() {
    let id = Uuid::new_v4();
    let store = Arc::new(MemoryCatalog::new());
    let mut item = CatalogItem::new(id, "Starfall");
    item.local_score = Some(40.0);
    item.local_synced_at = Some(Utc::now() - Duration::days(2));
    item.exists_externally = false;
    item.external_synced_at = Some(Utc::now());
    store.insert_item(item);
    store.insert_reviews(id, reviews(&[5, 5, 5, 5]));

    let engine = ConsensusEngine::new(store.clone(), None);
    let result = engine.consensus(id, false).await.unwrap();

    assert_eq!(result.local_score, Some(100.0));
    let saved = store.item(id).unwrap();
    assert!(saved.local_synced_at.unwrap() > Utc::now() - Duration::minutes(1));
}

#[tokio::test]
async fn zero_reviews_never_advance_the_local_stamp() {
    let id = Uuid::new_v4();
    let store = seeded_store(id, &[]);
    let transport = Arc::new(ScriptedInsight::replies(vec![
        exists_reply(),
        sentiment_reply(72.0),
    ]));
    let engine = ConsensusEngine::new(store.clone(), Some(transport));

    let result = engine.consensus(id, false).await.unwrap();
    assert_eq!(result.local_score, None);
    assert_eq!(result.local_review_count, 0);
    assert!(result.verdict.contains("be the first"));

    let saved = store.item(id).unwrap();
    assert!(saved.local_synced_at.is_none());
    assert!(saved.external_synced_at.is_some());
}

// ---------------------------------------------------------------------------
// Stale external window refreshes independently of local
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_external_window_refreshes_without_touching_fresh_local() {
    let id = Uuid::new_v4();
    let store = Arc::new(MemoryCatalog::new());
    let mut item = CatalogItem::new(id, "Starfall");
    item.local_score = Some(90.0);
    item.local_synced_at = Some(Utc::now());
    item.global_score = Some(10.0);
    item.exists_externally = true;
    item.external_synced_at = Some(Utc::now() - Duration::days(8));
    store.insert_item(item);
    store.insert_reviews(id, reviews(&[1, 1]));

    let transport = Arc::new(ScriptedInsight::replies(vec![
        exists_reply(),
        sentiment_reply(85.0),
    ]));
    let engine = ConsensusEngine::new(store.clone(), Some(transport.clone()));

    let result = engine.consensus(id, false).await.unwrap();

    // Local stayed cached, external was refreshed.
    assert_eq!(result.local_score, Some(90.0));
    assert_eq!(result.global_score, Some(85.0));
    assert_eq!(result.divergence, Some(5.0));
    assert!(result.verdict.contains("STRONG CONSENSUS"));
    assert_eq!(transport.call_count(), 2);
}

// ---------------------------------------------------------------------------
// Unknown item
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_item_is_an_error_not_a_verdict() {
    let store = Arc::new(MemoryCatalog::new());
    let engine = ConsensusEngine::new(store.clone(), None);

    let err = engine.consensus(Uuid::new_v4(), false).await.unwrap_err();
    assert!(matches!(
        err,
        storepulse_common::StorePulseError::ItemNotFound(_)
    ));
    assert_eq!(store.save_count(), 0);
}
