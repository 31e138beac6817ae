//! Business logic layered over [`FlashcardStore`](crate::store::FlashcardStore)
//!
//! - [`batch`]: per-item batch create accumulator
//! - [`csv_import`]: CSV upload parsing and import
//! - [`export`]: CSV / JSON downloads

pub mod batch;
pub mod csv_import;
pub mod export;
