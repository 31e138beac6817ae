//! In-memory flashcard store
//!
//! Cards live in an id-ordered `Vec` behind a tokio `RwLock`. Ids come from
//! a monotonic counter and are never reused, even after deletes.

use async_trait::async_trait;
use kotoba_common::models::sample_flashcards;
use kotoba_common::time::now;
use kotoba_common::{
    BatchOperationResult, BatchOptions, Category, CreateFlashcardRequest, DifficultyLevel,
    Error, Flashcard, FlashcardFilter, PageRequest, Result, UpdateFlashcardRequest,
};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::FlashcardStore;
use crate::services::batch::{self, BatchWriter};

#[derive(Debug)]
struct MemoryInner {
    /// Always sorted by ascending id (appends only, ids increase)
    cards: Vec<Flashcard>,
    next_id: i64,
}

impl MemoryInner {
    fn position(&self, id: i64) -> Result<usize> {
        self.cards
            .binary_search_by_key(&id, |c| c.id)
            .map_err(|_| Error::NotFound(id))
    }

    fn push_new(&mut self, request: &CreateFlashcardRequest) -> Flashcard {
        let card = Flashcard::new(self.next_id, request, now());
        self.next_id += 1;
        self.cards.push(card.clone());
        card
    }
}

#[async_trait]
impl BatchWriter for MemoryInner {
    async fn contains_identity(&mut self, request: &CreateFlashcardRequest) -> Result<bool> {
        Ok(self.cards.iter().any(|c| c.has_identity_of(request)))
    }

    async fn insert(&mut self, request: &CreateFlashcardRequest) -> Result<Flashcard> {
        Ok(self.push_new(request))
    }
}

/// Process-lifetime store; contents are lost on restart
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Empty store, first id is 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                cards: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store holding the four demo cards, next id is 5
    pub fn with_sample_data() -> Self {
        let cards = sample_flashcards(now());
        let next_id = cards.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(MemoryInner { cards, next_id }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlashcardStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, filter: &FlashcardFilter, page: PageRequest) -> Result<Vec<Flashcard>> {
        let inner = self.inner.read().await;
        Ok(page.slice(inner.cards.iter().filter(|c| filter.matches(c)).cloned()))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.inner.read().await.cards.len() as i64)
    }

    async fn get(&self, id: i64) -> Result<Flashcard> {
        let inner = self.inner.read().await;
        let index = inner.position(id)?;
        Ok(inner.cards[index].clone())
    }

    async fn create(&self, request: &CreateFlashcardRequest) -> Result<Flashcard> {
        request.validate()?;
        let mut inner = self.inner.write().await;
        Ok(inner.push_new(request))
    }

    async fn update(&self, id: i64, patch: &UpdateFlashcardRequest) -> Result<Flashcard> {
        patch.validate()?;
        let mut inner = self.inner.write().await;
        let index = inner.position(id)?;
        let card = &mut inner.cards[index];
        patch.apply_to(card);
        Ok(card.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let index = inner.position(id)?;
        inner.cards.remove(index);
        Ok(())
    }

    async fn mark_reviewed(&self, id: i64) -> Result<Flashcard> {
        let mut inner = self.inner.write().await;
        let index = inner.position(id)?;
        let card = &mut inner.cards[index];
        card.mark_reviewed(now());
        Ok(card.clone())
    }

    async fn random(
        &self,
        count: usize,
        category: Option<Category>,
        difficulty: Option<DifficultyLevel>,
    ) -> Result<Vec<Flashcard>> {
        let filter = FlashcardFilter {
            category,
            difficulty,
            ..Default::default()
        };
        let mut pool: Vec<Flashcard> = {
            let inner = self.inner.read().await;
            inner.cards.iter().filter(|c| filter.matches(c)).cloned().collect()
        };
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        Ok(pool)
    }

    async fn create_batch(
        &self,
        requests: &[CreateFlashcardRequest],
        options: BatchOptions,
    ) -> BatchOperationResult {
        let mut inner = self.inner.write().await;
        let rollback_len = inner.cards.len();

        match batch::run_batch(&mut *inner, requests, options).await {
            Ok(result) => {
                debug!(
                    success = result.success_count,
                    errors = result.error_count,
                    "Memory batch applied"
                );
                result
            }
            Err(e) => {
                // Batch only appends, so truncating restores the prior state.
                // next_id keeps advancing; ids are never handed out twice.
                inner.cards.truncate(rollback_len);
                error!("Memory batch aborted: {}", e);
                BatchOperationResult::aborted(requests.len(), batch::abort_message(&e))
            }
        }
    }
}
