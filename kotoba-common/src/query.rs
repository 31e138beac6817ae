//! Filter and pagination shapes shared by both store backends
//!
//! The memory store evaluates [`FlashcardFilter::matches`] directly; the SQL
//! store translates the same fields into a WHERE clause.

use serde::Deserialize;

use crate::models::{Category, DifficultyLevel, Flashcard, WordType};

/// Equality predicates plus an optional free-text search, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashcardFilter {
    pub category: Option<Category>,
    pub difficulty: Option<DifficultyLevel>,
    pub word_type: Option<WordType>,
    pub is_favorite: Option<bool>,
    pub search_term: Option<String>,
}

impl FlashcardFilter {
    /// Search term lowercased, or None when absent or empty
    pub fn normalized_search(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, card: &Flashcard) -> bool {
        if self.category.is_some_and(|c| c != card.category) {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != card.difficulty) {
            return false;
        }
        if self.word_type.is_some_and(|w| w != card.word_type) {
            return false;
        }
        if self.is_favorite.is_some_and(|f| f != card.is_favorite) {
            return false;
        }
        match self.normalized_search() {
            Some(term) => [&card.kanji, &card.hiragana, &card.katakana, &card.meaning]
                .iter()
                .any(|field| field.to_lowercase().contains(&term)),
            None => true,
        }
    }

    /// `%term%` LIKE pattern with `\`, `%` and `_` escaped (use `ESCAPE '\'`)
    pub fn like_pattern(&self) -> Option<String> {
        self.normalized_search().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for ch in term.chars() {
                if matches!(ch, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// Which slice of the id-ordered result to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page of `size` items
    Page { number: u32, size: u32 },
    /// Every match (export)
    All,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        match self {
            PageRequest::Page { number, size } => {
                (number.saturating_sub(1) as usize).saturating_mul(*size as usize)
            }
            PageRequest::All => 0,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            PageRequest::Page { size, .. } => Some(*size as usize),
            PageRequest::All => None,
        }
    }

    /// Apply skip/take to an already ordered sequence
    pub fn slice<T, I: IntoIterator<Item = T>>(&self, items: I) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset());
        match self.limit() {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Export filter options (`?category=&difficulty=&wordType=&isFavorite=`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub category: Option<Category>,
    pub difficulty: Option<DifficultyLevel>,
    pub word_type: Option<WordType>,
    pub is_favorite: Option<bool>,
}

impl ExportOptions {
    pub fn to_filter(&self) -> FlashcardFilter {
        FlashcardFilter {
            category: self.category,
            difficulty: self.difficulty,
            word_type: self.word_type,
            is_favorite: self.is_favorite,
            search_term: None,
        }
    }
}
