use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use storepulse_common::{ConsensusResult, StorePulseError};
use storepulse_engine::CatalogStore;

use crate::auth::check_admin_auth;
use crate::AppState;

#[derive(Deserialize)]
pub struct ConsensusQuery {
    refresh: Option<bool>,
}

/// Public consensus read. `?refresh=true` forces both cache windows.
pub async fn api_consensus(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    Query(params): Query<ConsensusQuery>,
) -> impl IntoResponse {
    let Ok(item_id) = Uuid::parse_str(&item_id) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let force_refresh = params.refresh.unwrap_or(false);

    match state.engine.consensus(item_id, force_refresh).await {
        Ok(result) => consensus_payload(&state, item_id, &result).await,
        Err(e) => consensus_error(e),
    }
}

/// Admin-only force refresh of both cache windows.
pub async fn api_refresh_consensus(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Ok(item_id) = Uuid::parse_str(&item_id) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    // External refresh spends Insight credits, so it is gated.
    if !check_admin_auth(&headers, &state.admin_username, &state.admin_password) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "success": false,
                "error": "Only administrators can force refresh external data",
            })),
        )
            .into_response();
    }

    match state.engine.consensus(item_id, true).await {
        Ok(result) => consensus_payload(&state, item_id, &result).await,
        Err(e) => consensus_error(e),
    }
}

async fn consensus_payload(
    state: &AppState,
    item_id: Uuid,
    result: &ConsensusResult,
) -> axum::response::Response {
    // Re-read for the title and the just-stamped sync time.
    let item = match state.store.get_item(item_id).await {
        Ok(Some(item)) => item,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to reload item after consensus");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(serde_json::json!({
        "success": true,
        "data": {
            "item_title": item.title,
            "local_sentiment": result.local_score,
            "global_sentiment": result.global_score,
            "divergence": result.divergence,
            "verdict": result.verdict,
            "sources": result.sources,
            "local_review_count": result.local_review_count,
            "local_avg_rating": result.local_average_rating,
            "exists_externally": result.exists_externally,
            "last_updated": item.external_synced_at.map(|at| at.to_rfc3339()),
        },
    }))
    .into_response()
}

fn consensus_error(e: StorePulseError) -> axum::response::Response {
    match e {
        StorePulseError::ItemNotFound(_) => StatusCode::NOT_FOUND.into_response(),
        other => {
            error!(error = %other, "Consensus request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Consensus computation failed",
                })),
            )
                .into_response()
        }
    }
}
