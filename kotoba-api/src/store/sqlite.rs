//! SQLite flashcard store
//!
//! One `flashcards` table, created on first connect. Ids come from
//! `AUTOINCREMENT`, so SQLite never hands out a deleted id again. Batch
//! creates run inside a single transaction.

use async_trait::async_trait;
use kotoba_common::models::sample_flashcards;
use kotoba_common::time::now;
use kotoba_common::{
    BatchOperationResult, BatchOptions, Category, CodedEnum, CreateFlashcardRequest,
    DifficultyLevel, Error, Flashcard, FlashcardFilter, PageRequest, Result,
    UpdateFlashcardRequest,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::FlashcardStore;
use crate::services::batch::{self, BatchWriter};

const SELECT_FLASHCARDS: &str = "SELECT id, kanji, hiragana, katakana, meaning, example, \
     word_type, difficulty, category, created_date, last_reviewed_date, review_count, \
     is_favorite FROM flashcards";

/// Columns the free-text search looks at
const SEARCH_COLUMNS: [&str; 4] = ["kanji", "hiragana", "katakana", "meaning"];

/// Durable store backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`
    ///
    /// `sqlite::memory:` URLs get a single pinned connection so the data
    /// outlives individual queries.
    pub async fn connect(database_url: &str, seed_sample_data: bool) -> Result<Self> {
        let in_memory = is_memory_url(database_url);

        let mut connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            connect_options = connect_options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(connect_options).await?;
        info!(in_memory, "SQLite pool ready");

        Self::from_pool(pool, seed_sample_data).await
    }

    /// Wrap an existing pool, creating the schema if absent
    ///
    /// Sample cards are seeded only when this call created the table.
    pub async fn from_pool(pool: SqlitePool, seed_sample_data: bool) -> Result<Self> {
        let created = init_schema(&pool).await?;
        let store = Self { pool };

        if created && seed_sample_data {
            store.seed_samples().await?;
        }

        Ok(store)
    }

    async fn seed_samples(&self) -> Result<()> {
        let samples = sample_flashcards(now());
        let mut tx = self.pool.begin().await?;

        for card in &samples {
            sqlx::query(
                r#"
                INSERT INTO flashcards (id, kanji, hiragana, katakana, meaning, example,
                    word_type, difficulty, category, created_date, last_reviewed_date,
                    review_count, is_favorite)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(card.id)
            .bind(&card.kanji)
            .bind(&card.hiragana)
            .bind(&card.katakana)
            .bind(&card.meaning)
            .bind(&card.example)
            .bind(card.word_type.code())
            .bind(card.difficulty.code())
            .bind(card.category.code())
            .bind(card.created_date)
            .bind(card.last_reviewed_date)
            .bind(card.review_count)
            .bind(card.is_favorite)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Seeded {} sample flashcards", samples.len());
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Create the table and indexes; returns true if the table did not exist
async fn init_schema(pool: &SqlitePool) -> Result<bool> {
    let existing: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'flashcards'",
    )
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kanji TEXT NOT NULL DEFAULT '',
            hiragana TEXT NOT NULL DEFAULT '',
            katakana TEXT NOT NULL DEFAULT '',
            meaning TEXT NOT NULL,
            example TEXT,
            word_type INTEGER NOT NULL DEFAULT 0,
            difficulty INTEGER NOT NULL DEFAULT 1,
            category INTEGER NOT NULL DEFAULT 0,
            created_date TEXT NOT NULL,
            last_reviewed_date TEXT,
            review_count INTEGER NOT NULL DEFAULT 0,
            is_favorite BOOLEAN NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_flashcards_category ON flashcards(category)",
        "CREATE INDEX IF NOT EXISTS idx_flashcards_difficulty ON flashcards(difficulty)",
        "CREATE INDEX IF NOT EXISTS idx_flashcards_word_type ON flashcards(word_type)",
        "CREATE INDEX IF NOT EXISTS idx_flashcards_is_favorite ON flashcards(is_favorite)",
        "CREATE INDEX IF NOT EXISTS idx_flashcards_forms ON flashcards(kanji, hiragana, katakana)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    let created = existing == 0;
    if created {
        debug!("Created flashcards table");
    }
    Ok(created)
}

fn decode_code<T: CodedEnum>(code: i64) -> Result<T> {
    T::from_code(code).ok_or_else(|| {
        Error::Internal(format!("Stored {} code {} is out of range", T::TYPE_NAME, code))
    })
}

fn row_to_flashcard(row: &SqliteRow) -> Result<Flashcard> {
    Ok(Flashcard {
        id: row.try_get("id")?,
        kanji: row.try_get("kanji")?,
        hiragana: row.try_get("hiragana")?,
        katakana: row.try_get("katakana")?,
        meaning: row.try_get("meaning")?,
        example: row.try_get("example")?,
        word_type: decode_code(row.try_get("word_type")?)?,
        difficulty: decode_code(row.try_get("difficulty")?)?,
        category: decode_code(row.try_get("category")?)?,
        created_date: row.try_get("created_date")?,
        last_reviewed_date: row.try_get("last_reviewed_date")?,
        review_count: row.try_get("review_count")?,
        is_favorite: row.try_get("is_favorite")?,
    })
}

/// Append the WHERE clause for `filter`
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &FlashcardFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.code());
    }
    if let Some(difficulty) = filter.difficulty {
        qb.push(" AND difficulty = ").push_bind(difficulty.code());
    }
    if let Some(word_type) = filter.word_type {
        qb.push(" AND word_type = ").push_bind(word_type.code());
    }
    if let Some(is_favorite) = filter.is_favorite {
        qb.push(" AND is_favorite = ").push_bind(is_favorite);
    }
    if let Some(pattern) = filter.like_pattern() {
        qb.push(" AND (");
        for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("LOWER({}) LIKE ", column))
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

async fn fetch_card(conn: &mut SqliteConnection, id: i64) -> Result<Option<Flashcard>> {
    let sql = format!("{} WHERE id = ?", SELECT_FLASHCARDS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    row.as_ref().map(row_to_flashcard).transpose()
}

async fn insert_card(conn: &mut SqliteConnection, request: &CreateFlashcardRequest) -> Result<Flashcard> {
    let created = now();
    let result = sqlx::query(
        r#"
        INSERT INTO flashcards (kanji, hiragana, katakana, meaning, example,
            word_type, difficulty, category, created_date, review_count, is_favorite)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0)
        "#,
    )
    .bind(&request.kanji)
    .bind(&request.hiragana)
    .bind(&request.katakana)
    .bind(&request.meaning)
    .bind(&request.example)
    .bind(request.word_type.code())
    .bind(request.difficulty.code())
    .bind(request.category.code())
    .bind(created)
    .execute(&mut *conn)
    .await?;

    Ok(Flashcard::new(result.last_insert_rowid(), request, created))
}

#[async_trait]
impl BatchWriter for SqliteConnection {
    async fn contains_identity(&mut self, request: &CreateFlashcardRequest) -> Result<bool> {
        let matches: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM flashcards WHERE kanji = ? AND hiragana = ? AND katakana = ?",
        )
        .bind(&request.kanji)
        .bind(&request.hiragana)
        .bind(&request.katakana)
        .fetch_one(&mut *self)
        .await?;
        Ok(matches > 0)
    }

    async fn insert(&mut self, request: &CreateFlashcardRequest) -> Result<Flashcard> {
        insert_card(self, request).await
    }
}

#[async_trait]
impl FlashcardStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, filter: &FlashcardFilter, page: PageRequest) -> Result<Vec<Flashcard>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_FLASHCARDS);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id ASC");

        if let PageRequest::Page { .. } = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit().unwrap_or_default() as i64)
                .push(" OFFSET ")
                .push_bind(page.offset() as i64);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_flashcard).collect()
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flashcards")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get(&self, id: i64) -> Result<Flashcard> {
        let mut conn = self.pool.acquire().await?;
        fetch_card(&mut conn, id).await?.ok_or(Error::NotFound(id))
    }

    async fn create(&self, request: &CreateFlashcardRequest) -> Result<Flashcard> {
        request.validate()?;
        let mut conn = self.pool.acquire().await?;
        insert_card(&mut conn, request).await
    }

    async fn update(&self, id: i64, patch: &UpdateFlashcardRequest) -> Result<Flashcard> {
        patch.validate()?;
        let mut tx = self.pool.begin().await?;

        let mut card = fetch_card(&mut *tx, id).await?.ok_or(Error::NotFound(id))?;
        patch.apply_to(&mut card);

        sqlx::query(
            r#"
            UPDATE flashcards
            SET kanji = ?, hiragana = ?, katakana = ?, meaning = ?, example = ?,
                word_type = ?, difficulty = ?, category = ?, is_favorite = ?
            WHERE id = ?
            "#,
        )
        .bind(&card.kanji)
        .bind(&card.hiragana)
        .bind(&card.katakana)
        .bind(&card.meaning)
        .bind(&card.example)
        .bind(card.word_type.code())
        .bind(card.difficulty.code())
        .bind(card.category.code())
        .bind(card.is_favorite)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(card)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    async fn mark_reviewed(&self, id: i64) -> Result<Flashcard> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE flashcards SET review_count = review_count + 1, last_reviewed_date = ? WHERE id = ?",
        )
        .bind(now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }

        let card = fetch_card(&mut *tx, id).await?.ok_or(Error::NotFound(id))?;
        tx.commit().await?;
        Ok(card)
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

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_FLASHCARDS);
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY RANDOM() LIMIT ").push_bind(count as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_flashcard).collect()
    }

    async fn create_batch(
        &self,
        requests: &[CreateFlashcardRequest],
        options: BatchOptions,
    ) -> BatchOperationResult {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                let e = Error::from(e);
                error!("Could not start batch transaction: {}", e);
                return BatchOperationResult::aborted(requests.len(), batch::abort_message(&e));
            }
        };

        match batch::run_batch(&mut *tx, requests, options).await {
            Ok(result) => match tx.commit().await {
                Ok(()) => {
                    debug!(
                        success = result.success_count,
                        errors = result.error_count,
                        "Batch transaction committed"
                    );
                    result
                }
                Err(e) => {
                    let e = Error::from(e);
                    error!("Batch commit failed: {}", e);
                    BatchOperationResult::aborted(requests.len(), batch::abort_message(&e))
                }
            },
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Batch rollback failed: {}", rollback_err);
                }
                error!("Batch aborted and rolled back: {}", e);
                BatchOperationResult::aborted(requests.len(), batch::abort_message(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:", true).await.unwrap()
    }

    #[test]
    fn test_memory_url_detection() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file:shared?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://kotoba.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_seeded_rows_decode() {
        let store = memory_store().await;
        let dog = store.get(1).await.unwrap();
        assert_eq!(dog.kanji, "犬");
        assert_eq!(dog.category, Category::Animals);
        assert_eq!(dog.review_count, 3);
        assert!(dog.is_favorite);
        assert!(dog.last_reviewed_date.is_some());
    }

    #[tokio::test]
    async fn test_autoincrement_continues_after_seed() {
        let store = memory_store().await;
        let card = store
            .create(&CreateFlashcardRequest {
                meaning: "cat".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(card.id, 5);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let store = SqliteStore::connect("sqlite::memory:", false).await.unwrap();
        for meaning in ["100% juice", "100 juice"] {
            store
                .create(&CreateFlashcardRequest {
                    meaning: meaning.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let filter = FlashcardFilter {
            search_term: Some("100%".to_string()),
            ..Default::default()
        };
        let found = store.list(&filter, PageRequest::All).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meaning, "100% juice");
    }

    #[tokio::test]
    async fn test_out_of_range_code_is_reported() {
        let store = memory_store().await;
        sqlx::query("UPDATE flashcards SET category = 99 WHERE id = 1")
            .execute(&store.pool)
            .await
            .unwrap();
        assert!(matches!(store.get(1).await, Err(Error::Internal(_))));
    }
}
