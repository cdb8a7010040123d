use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use insight_client::{InsightClient, InsightTransport, MockInsight};
use storepulse_common::Config;
use storepulse_engine::{CatalogStore, ConsensusEngine};

mod auth;
mod db;
mod rest;

use db::PgCatalogStore;

pub struct AppState {
    pub engine: ConsensusEngine,
    pub store: Arc<PgCatalogStore>,
    pub admin_username: String,
    pub admin_password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("storepulse_api=info".parse()?)
                .add_directive("storepulse_engine=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete");

    let transport: Option<Arc<dyn InsightTransport>> = if config.insight_mock {
        info!("Insight mock mode enabled, serving canned external sentiment");
        Some(Arc::new(MockInsight))
    } else if config.insight_api_key.is_empty() {
        warn!("INSIGHT_API_KEY not set; external sentiment will fail open");
        None
    } else {
        info!("Insight API key configured");
        Some(Arc::new(InsightClient::new(
            &config.insight_api_key,
            Duration::from_secs(config.insight_timeout_secs),
        )))
    };

    let store = Arc::new(PgCatalogStore::new(pool));
    let engine = ConsensusEngine::new(store.clone() as Arc<dyn CatalogStore>, transport);

    let state = Arc::new(AppState {
        engine,
        store,
        admin_username: config.admin_username,
        admin_password: config.admin_password,
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Consensus API
        .route("/api/consensus/{item_id}", get(rest::api_consensus))
        .route(
            "/api/consensus/{item_id}/refresh",
            post(rest::api_refresh_consensus),
        )
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only (no query params)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("StorePulse API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
