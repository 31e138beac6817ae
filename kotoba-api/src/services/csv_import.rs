//! CSV import
//!
//! Expected header: `Kanji,Hiragana,Katakana,Meaning,Example,WordType,Difficulty,Category`.
//! Extra columns (e.g. the export's `CreatedDate`) are ignored, so an export
//! file can be imported unchanged. Rows that fail to parse or validate are
//! reported as `Line N: ...` and skipped; the rest go through the batch path
//! with duplicate skipping on.

use kotoba_common::{
    BatchOperationResult, BatchOptions, Category, CodedEnum, CreateFlashcardRequest,
    DifficultyLevel, Error, Result, WordType,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::store::FlashcardStore;

/// Column order of the import format and the template
pub const IMPORT_HEADERS: [&str; 8] = [
    "Kanji",
    "Hiragana",
    "Katakana",
    "Meaning",
    "Example",
    "WordType",
    "Difficulty",
    "Category",
];

/// Columns without which no row could be valid
const REQUIRED_HEADERS: [&str; 4] = ["Meaning", "WordType", "Difficulty", "Category"];

/// Body of the template download
pub const CSV_TEMPLATE: &str = "\
Kanji,Hiragana,Katakana,Meaning,Example,WordType,Difficulty,Category
犬,いぬ,,dog,私の犬はとても可愛いです。,1,1,1
,,コーヒー,coffee,朝のコーヒーは美味しいです。,2,1,3
,おはよう,,good morning,おはようございます。,0,1,0
";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Deserialize)]
struct CsvFlashcardRecord {
    #[serde(rename = "Kanji", default)]
    kanji: String,
    #[serde(rename = "Hiragana", default)]
    hiragana: String,
    #[serde(rename = "Katakana", default)]
    katakana: String,
    #[serde(rename = "Meaning", default)]
    meaning: String,
    #[serde(rename = "Example", default)]
    example: Option<String>,
    #[serde(rename = "WordType")]
    word_type: i64,
    #[serde(rename = "Difficulty")]
    difficulty: i64,
    #[serde(rename = "Category")]
    category: i64,
}

impl CsvFlashcardRecord {
    fn into_request(self) -> std::result::Result<CreateFlashcardRequest, String> {
        if self.meaning.trim().is_empty() {
            return Err("Meaning is required".to_string());
        }

        Ok(CreateFlashcardRequest {
            word_type: defined_code::<WordType>("WordType", self.word_type)?,
            difficulty: defined_code::<DifficultyLevel>("Difficulty", self.difficulty)?,
            category: defined_code::<Category>("Category", self.category)?,
            kanji: self.kanji,
            hiragana: self.hiragana,
            katakana: self.katakana,
            meaning: self.meaning,
            example: self.example.filter(|e| !e.is_empty()),
        })
    }
}

fn defined_code<T: CodedEnum>(column: &str, code: i64) -> std::result::Result<T, String> {
    T::from_code(code).ok_or_else(|| format!("{} value {} is not defined", column, code))
}

/// Outcome of reading a CSV file, before anything is stored
#[derive(Debug, Default)]
pub struct ParsedCsv {
    /// Number of data records seen
    pub total_records: usize,
    /// Valid rows, in file order
    pub requests: Vec<CreateFlashcardRequest>,
    /// `Line N: ...` messages for rejected rows
    pub errors: Vec<String>,
}

/// Parse and validate a CSV upload
///
/// # Errors
///
/// Fails when the header row cannot be read or lacks a required column.
/// Problems with individual rows are collected in [`ParsedCsv::errors`].
pub fn parse_csv(data: &[u8]) -> Result<ParsedCsv> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();
    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "CSV header is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut parsed = ParsedCsv::default();

    for (index, record) in reader.records().enumerate() {
        parsed.total_records += 1;
        // Header is line 1; used only when the reader has no position
        let fallback_line = index as u64 + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line());
                parsed.errors.push(format!("Line {}: {}", line, describe(&e)));
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line());

        let outcome = record
            .deserialize::<CsvFlashcardRecord>(Some(&headers))
            .map_err(|e| describe(&e))
            .and_then(CsvFlashcardRecord::into_request);

        match outcome {
            Ok(request) => parsed.requests.push(request),
            Err(msg) => parsed.errors.push(format!("Line {}: {}", line, msg)),
        }
    }

    debug!(
        records = parsed.total_records,
        valid = parsed.requests.len(),
        rejected = parsed.errors.len(),
        "Parsed CSV upload"
    );
    Ok(parsed)
}

/// Short message for a csv error without the reader's position prefix
fn describe(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {}", err),
        _ => err.to_string(),
    }
}

/// Parse a CSV upload and create its valid rows, skipping duplicates
///
/// Row errors come first in the result's messages, then batch errors.
pub async fn import_csv(store: &dyn FlashcardStore, data: &[u8]) -> Result<BatchOperationResult> {
    let parsed = parse_csv(data)?;

    let mut result = BatchOperationResult::new(parsed.total_records);
    for message in parsed.errors {
        result.record_error(message);
    }

    if !parsed.requests.is_empty() {
        let options = BatchOptions {
            skip_duplicates: true,
            validate_only: false,
        };
        let batch = store.create_batch(&parsed.requests, options).await;

        result.success_count = batch.success_count;
        result.error_count += batch.error_count;
        result.error_messages.extend(batch.error_messages);
        result.created_flashcards = batch.created_flashcards;
    }

    if result.error_count > 0 {
        warn!(
            errors = result.error_count,
            "CSV import finished with rejected rows"
        );
    }
    info!(
        total = result.total_processed,
        created = result.success_count,
        "CSV import complete"
    );
    Ok(result)
}
