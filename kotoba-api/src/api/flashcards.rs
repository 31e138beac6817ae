//! Flashcard CRUD, review and random-sample handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use kotoba_common::{
    Category, CreateFlashcardRequest, DifficultyLevel, Flashcard, FlashcardFilter, PageRequest,
    UpdateFlashcardRequest, WordType,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::store::MAX_RANDOM_COUNT;
use crate::AppState;

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

fn default_random_count() -> i64 {
    5
}

/// Query parameters for GET /api/flashcards
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<Category>,
    pub difficulty: Option<DifficultyLevel>,
    pub word_type: Option<WordType>,
    pub is_favorite: Option<bool>,
    pub search_term: Option<String>,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl ListQuery {
    /// Split into the store's filter and page shapes, rejecting pages below 1
    pub fn into_parts(self) -> ApiResult<(FlashcardFilter, PageRequest)> {
        let number = positive_u32("pageNumber", self.page_number)?;
        let size = positive_u32("pageSize", self.page_size)?;

        let filter = FlashcardFilter {
            category: self.category,
            difficulty: self.difficulty,
            word_type: self.word_type,
            is_favorite: self.is_favorite,
            search_term: self.search_term,
        };
        Ok((filter, PageRequest::Page { number, size }))
    }
}

fn positive_u32(name: &str, value: i64) -> ApiResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| ApiError::BadRequest(format!("{} must be a positive integer", name)))
}

/// Query parameters for GET /api/flashcards/random
#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    #[serde(default = "default_random_count")]
    pub count: i64,
    pub category: Option<Category>,
    pub difficulty: Option<DifficultyLevel>,
}

/// GET /api/flashcards
pub async fn list_flashcards(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Flashcard>>> {
    let (filter, page) = query.into_parts()?;
    let cards = state.store.list(&filter, page).await?;
    debug!(?filter, ?page, returned = cards.len(), "Listed flashcards");
    Ok(Json(cards))
}

/// GET /api/flashcards/:id
pub async fn get_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Flashcard>> {
    Ok(Json(state.store.get(id).await?))
}

/// POST /api/flashcards
///
/// Responds 201 with a `Location` header pointing at the new card.
pub async fn create_flashcard(
    State(state): State<AppState>,
    Json(request): Json<CreateFlashcardRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;
    let card = state.store.create(&request).await?;
    info!(id = card.id, meaning = %card.meaning, "Created flashcard");

    let location = format!("/api/flashcards/{}", card.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(card)))
}

/// PUT or PATCH /api/flashcards/:id
pub async fn update_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateFlashcardRequest>,
) -> ApiResult<Json<Flashcard>> {
    patch.validate()?;
    let card = state.store.update(id, &patch).await?;
    info!(id, "Updated flashcard");
    Ok(Json(card))
}

/// DELETE /api/flashcards/:id
pub async fn delete_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete(id).await?;
    info!(id, "Deleted flashcard");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/flashcards/:id/review
pub async fn review_flashcard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Flashcard>> {
    let card = state.store.mark_reviewed(id).await?;
    debug!(id, review_count = card.review_count, "Marked flashcard reviewed");
    Ok(Json(card))
}

/// GET /api/flashcards/random
pub async fn random_flashcards(
    State(state): State<AppState>,
    Query(query): Query<RandomQuery>,
) -> ApiResult<Json<Vec<Flashcard>>> {
    let count = usize::try_from(query.count)
        .ok()
        .filter(|c| (1..=MAX_RANDOM_COUNT).contains(c))
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Count must be between 1 and {}", MAX_RANDOM_COUNT))
        })?;

    let cards = state
        .store
        .random(count, query.category, query.difficulty)
        .await?;
    debug!(requested = count, returned = cards.len(), "Sampled random flashcards");
    Ok(Json(cards))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page_number: i64, page_size: i64) -> ListQuery {
        ListQuery {
            category: None,
            difficulty: None,
            word_type: None,
            is_favorite: None,
            search_term: None,
            page_number,
            page_size,
        }
    }

    #[test]
    fn test_page_bounds() {
        let (_, page) = query(2, 25).into_parts().unwrap();
        assert_eq!(page, PageRequest::Page { number: 2, size: 25 });
        assert!(query(0, 10).into_parts().is_err());
        assert!(query(1, 0).into_parts().is_err());
        assert!(query(-3, 10).into_parts().is_err());
    }
}
