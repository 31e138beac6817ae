//! Flashcard entity model and request/response payloads
//!
//! Classification enums serialize as their integer code and accept either the
//! code (number or numeric string) or the variant name when deserializing, so
//! `?category=1` and `?category=Animals` are equivalent.

use chrono::{DateTime, Duration, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::{Error, Result};

/// Integer-coded enumeration stored as a small integer in CSV and SQL
pub trait CodedEnum: Sized + Copy + 'static {
    /// Type name used in error messages
    const TYPE_NAME: &'static str;

    /// Every variant in code order
    fn all() -> &'static [Self];
    fn code(self) -> i32;
    fn name(self) -> &'static str;
    fn description(self) -> &'static str;
    fn from_code(code: i64) -> Option<Self>;

    /// Case-insensitive variant name lookup
    fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }

    /// Parse from a code ("1") or a name ("Animals")
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let parsed = match input.parse::<i64>() {
            Ok(code) => Self::from_code(code),
            Err(_) => Self::from_name(input),
        };
        parsed.ok_or_else(|| {
            Error::InvalidInput(format!("Invalid {}: {}", Self::TYPE_NAME, input))
        })
    }
}

struct CodedEnumVisitor<T>(PhantomData<T>);

impl<'de, T: CodedEnum> Visitor<'de> for CodedEnumVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a {} code or name", T::TYPE_NAME)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<T, E> {
        T::from_code(v)
            .ok_or_else(|| E::custom(format!("invalid {} code: {}", T::TYPE_NAME, v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<T, E> {
        let code = i64::try_from(v)
            .map_err(|_| E::custom(format!("invalid {} code: {}", T::TYPE_NAME, v)))?;
        self.visit_i64(code)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<T, E> {
        T::parse(v).map_err(E::custom)
    }
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $desc:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $code ),+
        }

        impl CodedEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn code(self) -> i32 {
                self as i32
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn description(self) -> &'static str {
                match self {
                    $($name::$variant => $desc),+
                }
            }

            fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                <Self as CodedEnum>::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_i32(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                deserializer.deserialize_any(CodedEnumVisitor::<$name>(PhantomData))
            }
        }
    };
}

coded_enum! {
    /// Linguistic origin of a word
    WordType {
        #[default]
        Native = 0 => "Native Japanese word (mostly hiragana)",
        SinoJapanese = 1 => "Sino-Japanese word (kanji with on'yomi reading)",
        Foreign = 2 => "Loanword (mostly katakana)",
        Mixed = 3 => "Compound mixing hiragana and katakana",
    }
}

coded_enum! {
    /// Learner level a card targets
    DifficultyLevel {
        #[default]
        Beginner = 1 => "Beginner level",
        Intermediate = 2 => "Intermediate level",
        Advanced = 3 => "Advanced level",
        Expert = 4 => "Expert level",
    }
}

coded_enum! {
    /// Topic category
    Category {
        #[default]
        General = 0 => "General vocabulary",
        Animals = 1 => "Animals",
        Colors = 2 => "Colors",
        Food = 3 => "Food and drink",
        Nature = 4 => "Nature, weather and environment",
        Family = 5 => "Family members and relations",
        Body = 6 => "Parts of the body",
        Transportation = 7 => "Transportation",
        Time = 8 => "Time and dates",
        Numbers = 9 => "Numbers and counting",
        Verbs = 10 => "Verbs",
        Adjectives = 11 => "Adjectives",
    }
}

/// Enum listing entry for the `/categories`, `/difficulties` and `/wordtypes` endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EnumValue {
    pub value: i32,
    pub name: &'static str,
    pub description: &'static str,
}

/// All values of a coded enum, in code order
pub fn enum_values<T: CodedEnum>() -> Vec<EnumValue> {
    T::all()
        .iter()
        .map(|v| EnumValue {
            value: v.code(),
            name: v.name(),
            description: v.description(),
        })
        .collect()
}

/// A single vocabulary card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: i64,
    pub kanji: String,
    pub hiragana: String,
    pub katakana: String,
    pub meaning: String,
    pub example: Option<String>,
    pub word_type: WordType,
    pub difficulty: DifficultyLevel,
    pub category: Category,
    pub created_date: DateTime<Utc>,
    pub last_reviewed_date: Option<DateTime<Utc>>,
    pub review_count: i64,
    pub is_favorite: bool,
}

impl Flashcard {
    /// Build a fresh, never-reviewed card from a create request
    pub fn new(id: i64, request: &CreateFlashcardRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kanji: request.kanji.clone(),
            hiragana: request.hiragana.clone(),
            katakana: request.katakana.clone(),
            meaning: request.meaning.clone(),
            example: request.example.clone(),
            word_type: request.word_type,
            difficulty: request.difficulty,
            category: request.category,
            created_date: now,
            last_reviewed_date: None,
            review_count: 0,
            is_favorite: false,
        }
    }

    /// Record one review
    pub fn mark_reviewed(&mut self, now: DateTime<Utc>) {
        self.last_reviewed_date = Some(now);
        self.review_count += 1;
    }

    /// True when kanji, hiragana and katakana all match the request
    pub fn has_identity_of(&self, request: &CreateFlashcardRequest) -> bool {
        self.kanji == request.kanji
            && self.hiragana == request.hiragana
            && self.katakana == request.katakana
    }
}

/// Payload for creating a card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashcardRequest {
    #[serde(default)]
    pub kanji: String,
    #[serde(default)]
    pub hiragana: String,
    #[serde(default)]
    pub katakana: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub word_type: WordType,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub category: Category,
}

impl CreateFlashcardRequest {
    pub fn validate(&self) -> Result<()> {
        if self.meaning.trim().is_empty() {
            return Err(Error::InvalidInput("Meaning is required".to_string()));
        }
        Ok(())
    }

    /// Human-readable label combining the three written forms
    pub fn display_forms(&self) -> String {
        format!("{}{}{}", self.kanji, self.hiragana, self.katakana)
    }
}

/// Partial update payload
///
/// `None` leaves a field untouched. A present empty string clears kanji,
/// hiragana, katakana or example; a blank meaning is rejected by `validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlashcardRequest {
    pub kanji: Option<String>,
    pub hiragana: Option<String>,
    pub katakana: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub word_type: Option<WordType>,
    pub difficulty: Option<DifficultyLevel>,
    pub category: Option<Category>,
    pub is_favorite: Option<bool>,
}

impl UpdateFlashcardRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(meaning) = &self.meaning {
            if meaning.trim().is_empty() {
                return Err(Error::InvalidInput("Meaning cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Overwrite every field present in the patch
    pub fn apply_to(&self, card: &mut Flashcard) {
        if let Some(kanji) = &self.kanji {
            card.kanji = kanji.clone();
        }
        if let Some(hiragana) = &self.hiragana {
            card.hiragana = hiragana.clone();
        }
        if let Some(katakana) = &self.katakana {
            card.katakana = katakana.clone();
        }
        if let Some(meaning) = &self.meaning {
            card.meaning = meaning.clone();
        }
        if let Some(example) = &self.example {
            card.example = if example.is_empty() {
                None
            } else {
                Some(example.clone())
            };
        }
        if let Some(word_type) = self.word_type {
            card.word_type = word_type;
        }
        if let Some(difficulty) = self.difficulty {
            card.difficulty = difficulty;
        }
        if let Some(category) = self.category {
            card.category = category;
        }
        if let Some(is_favorite) = self.is_favorite {
            card.is_favorite = is_favorite;
        }
    }
}

fn default_true() -> bool {
    true
}

/// Flags controlling a batch create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,
    #[serde(default)]
    pub validate_only: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            validate_only: false,
        }
    }
}

/// POST /api/flashcards/batch body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateRequest {
    #[serde(default)]
    pub flashcards: Vec<CreateFlashcardRequest>,
    #[serde(flatten)]
    pub options: BatchOptions,
}

/// Aggregate outcome of a batch create or CSV import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOperationResult {
    pub total_processed: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub error_messages: Vec<String>,
    pub created_flashcards: Vec<Flashcard>,
}

impl BatchOperationResult {
    pub fn new(total_processed: usize) -> Self {
        Self {
            total_processed,
            ..Self::default()
        }
    }

    /// Count a passing item; `created` is None in validate-only mode
    pub fn record_success(&mut self, created: Option<Flashcard>) {
        self.success_count += 1;
        if let Some(card) = created {
            self.created_flashcards.push(card);
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_count += 1;
        self.error_messages.push(message.into());
    }

    /// Whole-batch failure: nothing persisted, every item counted as failed
    pub fn aborted(total_processed: usize, message: impl Into<String>) -> Self {
        Self {
            total_processed,
            success_count: 0,
            error_count: total_processed,
            error_messages: vec![message.into()],
            created_flashcards: Vec::new(),
        }
    }
}

/// The four demo cards a fresh store starts with (ids 1..=4)
pub fn sample_flashcards(now: DateTime<Utc>) -> Vec<Flashcard> {
    let card = |id: i64,
                kanji: &str,
                hiragana: &str,
                katakana: &str,
                meaning: &str,
                example: &str,
                word_type: WordType,
                difficulty: DifficultyLevel,
                category: Category| Flashcard {
        id,
        kanji: kanji.to_string(),
        hiragana: hiragana.to_string(),
        katakana: katakana.to_string(),
        meaning: meaning.to_string(),
        example: Some(example.to_string()),
        word_type,
        difficulty,
        category,
        created_date: now,
        last_reviewed_date: None,
        review_count: 0,
        is_favorite: false,
    };

    let mut dog = card(
        1, "犬", "いぬ", "", "dog", "私の犬はとても可愛いです。",
        WordType::SinoJapanese, DifficultyLevel::Beginner, Category::Animals,
    );
    dog.created_date = now - Duration::days(30);
    dog.last_reviewed_date = Some(now - Duration::days(5));
    dog.review_count = 3;
    dog.is_favorite = true;

    let mut coffee = card(
        2, "", "", "コーヒー", "coffee", "朝のコーヒーは美味しいです。",
        WordType::Foreign, DifficultyLevel::Beginner, Category::Food,
    );
    coffee.created_date = now - Duration::days(25);
    coffee.last_reviewed_date = Some(now - Duration::days(3));
    coffee.review_count = 5;

    let mut morning = card(
        3, "", "おはよう", "", "good morning", "おはようございます。",
        WordType::Native, DifficultyLevel::Beginner, Category::General,
    );
    morning.created_date = now - Duration::days(20);
    morning.last_reviewed_date = Some(now - Duration::days(2));
    morning.review_count = 2;
    morning.is_favorite = true;

    let mut computer = card(
        4, "", "", "コンピューター", "computer", "新しいコンピューターを買いました。",
        WordType::Foreign, DifficultyLevel::Intermediate, Category::General,
    );
    computer.created_date = now - Duration::days(15);
    computer.review_count = 1;

    vec![dog, coffee, morning, computer]
}
