//! CSV and JSON export of filtered flashcards

use kotoba_common::time::{file_stamp, format_date, now};
use kotoba_common::{CodedEnum, ExportOptions, Flashcard, PageRequest, Result};
use tracing::info;

use crate::store::FlashcardStore;

/// Export column order
pub const EXPORT_HEADERS: [&str; 11] = [
    "Kanji",
    "Hiragana",
    "Katakana",
    "Meaning",
    "Example",
    "WordType",
    "Difficulty",
    "Category",
    "CreatedDate",
    "ReviewCount",
    "IsFavorite",
];

/// Written first so spreadsheet tools detect UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

async fn fetch_all(store: &dyn FlashcardStore, options: &ExportOptions) -> Result<Vec<Flashcard>> {
    store.list(&options.to_filter(), PageRequest::All).await
}

pub async fn export_csv(store: &dyn FlashcardStore, options: &ExportOptions) -> Result<Vec<u8>> {
    let cards = fetch_all(store, options).await?;
    let body = write_csv(&cards)?;
    info!(count = cards.len(), bytes = body.len(), "Exported flashcards as CSV");
    Ok(body)
}

pub async fn export_json(store: &dyn FlashcardStore, options: &ExportOptions) -> Result<String> {
    let cards = fetch_all(store, options).await?;
    let body = serde_json::to_string_pretty(&cards)?;
    info!(count = cards.len(), "Exported flashcards as JSON");
    Ok(body)
}

/// Serialize cards as BOM-prefixed CSV; the header row is always written
pub fn write_csv(cards: &[Flashcard]) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(EXPORT_HEADERS)?;

        for card in cards {
            writer.write_record([
                card.kanji.clone(),
                card.hiragana.clone(),
                card.katakana.clone(),
                card.meaning.clone(),
                card.example.clone().unwrap_or_default(),
                card.word_type.code().to_string(),
                card.difficulty.code().to_string(),
                card.category.code().to_string(),
                format_date(&card.created_date),
                card.review_count.to_string(),
                card.is_favorite.to_string(),
            ])?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

/// Download name such as `flashcards_20261018_093000.csv`
pub fn export_filename(extension: &str) -> String {
    format!("flashcards_{}.{}", file_stamp(&now()), extension)
}
