//! Flashcard persistence
//!
//! One async contract, two backends:
//! - [`MemoryStore`]: process-lifetime list, lost on restart
//! - [`SqliteStore`]: durable `flashcards` table via sqlx
//!
//! The backend is chosen once at startup by [`open_store`].

use async_trait::async_trait;
use kotoba_common::config::ServiceConfig;
use kotoba_common::{
    BatchOperationResult, BatchOptions, Category, CreateFlashcardRequest, DifficultyLevel,
    Flashcard, FlashcardFilter, PageRequest, Result, UpdateFlashcardRequest,
};
use std::sync::Arc;
use tracing::info;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Largest sample the random endpoint may request
pub const MAX_RANDOM_COUNT: usize = 50;

/// Persistence contract shared by both backends
///
/// Single-item commands report a missing id as `Error::NotFound`.
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Short backend label for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    /// Matching cards ordered by ascending id, then paginated
    async fn list(&self, filter: &FlashcardFilter, page: PageRequest) -> Result<Vec<Flashcard>>;

    /// Total number of stored cards
    async fn count(&self) -> Result<i64>;

    async fn get(&self, id: i64) -> Result<Flashcard>;

    async fn create(&self, request: &CreateFlashcardRequest) -> Result<Flashcard>;

    /// Apply a partial update
    async fn update(&self, id: i64, patch: &UpdateFlashcardRequest) -> Result<Flashcard>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Increment the review counter and stamp the review time
    async fn mark_reviewed(&self, id: i64) -> Result<Flashcard>;

    /// Up to `count` distinct cards in uniformly random order
    async fn random(
        &self,
        count: usize,
        category: Option<Category>,
        difficulty: Option<DifficultyLevel>,
    ) -> Result<Vec<Flashcard>>;

    /// Create many cards as one unit of work
    ///
    /// Per-item problems are reported inside the result. A storage failure
    /// discards the whole batch and yields [`BatchOperationResult::aborted`].
    async fn create_batch(
        &self,
        requests: &[CreateFlashcardRequest],
        options: BatchOptions,
    ) -> BatchOperationResult;
}

/// Select and open the backend for this process
///
/// A configured `database_url` selects SQLite; otherwise cards live in memory.
pub async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn FlashcardStore>> {
    match &config.database_url {
        Some(url) => {
            let store = SqliteStore::connect(url, config.seed_sample_data).await?;
            info!(backend = store.backend_name(), "Using database-backed flashcard store");
            Ok(Arc::new(store))
        }
        None => {
            let store = if config.seed_sample_data {
                MemoryStore::with_sample_data()
            } else {
                MemoryStore::new()
            };
            info!(
                backend = store.backend_name(),
                "No database configured, flashcards will not survive a restart"
            );
            Ok(Arc::new(store))
        }
    }
}
