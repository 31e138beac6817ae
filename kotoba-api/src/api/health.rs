//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    /// "memory" or "sqlite"
    pub backend: String,
    pub flashcard_count: i64,
    pub uptime_seconds: i64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let flashcard_count = state.store.count().await?;
    let uptime_seconds = (kotoba_common::time::now() - state.startup_time)
        .num_seconds()
        .max(0);

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: "kotoba-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        backend: state.store.backend_name().to_string(),
        flashcard_count,
        uptime_seconds,
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
