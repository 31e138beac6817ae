//! Enum listing endpoints

use axum::Json;
use kotoba_common::models::{enum_values, EnumValue};
use kotoba_common::{Category, DifficultyLevel, WordType};

/// GET /api/flashcards/categories
pub async fn list_categories() -> Json<Vec<EnumValue>> {
    Json(enum_values::<Category>())
}

/// GET /api/flashcards/difficulties
pub async fn list_difficulties() -> Json<Vec<EnumValue>> {
    Json(enum_values::<DifficultyLevel>())
}

/// GET /api/flashcards/wordtypes
pub async fn list_word_types() -> Json<Vec<EnumValue>> {
    Json(enum_values::<WordType>())
}
