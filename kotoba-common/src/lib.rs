//! # Kotoba Common Library
//!
//! Shared code for the Kotoba flashcard service:
//! - Flashcard entity model and request payloads
//! - Filter and pagination shapes
//! - Configuration loading
//! - Error type
//! - Time helpers

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod time;

pub use error::{Error, Result};
pub use models::{
    BatchCreateRequest, BatchOperationResult, BatchOptions, Category, CodedEnum,
    CreateFlashcardRequest, DifficultyLevel, Flashcard, UpdateFlashcardRequest, WordType,
};
pub use query::{ExportOptions, FlashcardFilter, PageRequest};
