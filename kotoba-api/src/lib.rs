//! kotoba-api library - Japanese vocabulary flashcard service
//!
//! Exposes the router and state so integration tests can drive the service
//! without binding a socket.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod services;
pub mod store;

pub use error::{ApiError, ApiResult};
pub use store::{open_store, FlashcardStore, MemoryStore, SqliteStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Flashcard persistence backend, chosen at startup
    pub store: Arc<dyn FlashcardStore>,
    /// Service start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn FlashcardStore>) -> Self {
        Self {
            store,
            startup_time: kotoba_common::time::now(),
        }
    }
}

/// Build application router
///
/// Any origin may call the API (CORS is fully permissive).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::flashcard_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
