//! HTTP API handlers for kotoba-api

pub mod enums;
pub mod flashcards;
pub mod health;
pub mod transfer;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub use health::health_routes;

/// Routes under `/api/flashcards`
///
/// Fixed segments (`random`, `batch`, `export/...`) take precedence over `:id`.
pub fn flashcard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/flashcards",
            get(flashcards::list_flashcards).post(flashcards::create_flashcard),
        )
        .route("/api/flashcards/random", get(flashcards::random_flashcards))
        .route("/api/flashcards/categories", get(enums::list_categories))
        .route("/api/flashcards/difficulties", get(enums::list_difficulties))
        .route("/api/flashcards/wordtypes", get(enums::list_word_types))
        .route("/api/flashcards/batch", post(transfer::batch_create))
        .route("/api/flashcards/import/csv", post(transfer::import_csv))
        .route("/api/flashcards/export/csv", get(transfer::export_csv))
        .route("/api/flashcards/export/json", get(transfer::export_json))
        .route("/api/flashcards/template/csv", get(transfer::csv_template))
        .route(
            "/api/flashcards/:id",
            get(flashcards::get_flashcard)
                .put(flashcards::update_flashcard)
                .patch(flashcards::update_flashcard)
                .delete(flashcards::delete_flashcard),
        )
        .route("/api/flashcards/:id/review", post(flashcards::review_flashcard))
}
