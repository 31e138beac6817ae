//! Batch create accumulator shared by both store backends
//!
//! The store owns the unit of work (a held write lock or an open SQL
//! transaction) and hands it to [`run_batch`] as a [`BatchWriter`]. Any `Err`
//! returned here means the caller must discard everything the writer did.

use async_trait::async_trait;
use kotoba_common::{
    BatchOperationResult, BatchOptions, CreateFlashcardRequest, Error, Flashcard, Result,
};
use tracing::debug;

/// Write access to a store for the duration of one batch
#[async_trait]
pub trait BatchWriter: Send {
    /// True when a stored card has the same kanji, hiragana and katakana
    async fn contains_identity(&mut self, request: &CreateFlashcardRequest) -> Result<bool>;

    async fn insert(&mut self, request: &CreateFlashcardRequest) -> Result<Flashcard>;
}

/// Process items in order, recording per-item outcomes
///
/// Validation failures and skipped duplicates are counted as item errors and
/// processing continues. Storage errors stop the batch and are returned.
pub async fn run_batch<W>(
    writer: &mut W,
    requests: &[CreateFlashcardRequest],
    options: BatchOptions,
) -> Result<BatchOperationResult>
where
    W: BatchWriter + ?Sized,
{
    let mut result = BatchOperationResult::new(requests.len());

    for (index, request) in requests.iter().enumerate() {
        let item = index + 1;

        if let Err(e) = request.validate() {
            result.record_error(format!("Item {}: {}", item, item_message(e)));
            continue;
        }

        if options.skip_duplicates && writer.contains_identity(request).await? {
            debug!(item, forms = %request.display_forms(), "Skipping duplicate flashcard");
            result.record_error(format!(
                "Duplicate flashcard skipped: {}",
                request.display_forms()
            ));
            continue;
        }

        if options.validate_only {
            result.record_success(None);
        } else {
            let card = writer.insert(request).await?;
            result.record_success(Some(card));
        }
    }

    Ok(result)
}

/// Message for the single-entry error list of an aborted batch
pub fn abort_message(err: &Error) -> String {
    format!("Batch operation failed: {}", err)
}

fn item_message(err: Error) -> String {
    match err {
        Error::InvalidInput(msg) => msg,
        other => other.to_string(),
    }
}
