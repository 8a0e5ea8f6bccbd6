//! Word-level n-gram story generation library.
//!
//! This crate provides:
//! - A deterministic tokenizer isolating sentence-ending punctuation
//! - Two-pass training with unknown-token normalization
//! - Generation with context backoff and top-k sampling
//! - Model statistics, corpus loading and model persistence

/// Error type shared by the whole crate.
pub mod error;

/// Corpus loading and model persistence (postcard).
pub mod io;

/// N-gram model, training and statistics.
pub mod model;

/// Text to token sequence conversion.
pub mod tokenizer;

pub use error::{Error, Result};
pub use model::config::NGramConfig;
pub use model::ngram_model::NGramModel;
pub use model::stats::ModelStats;
pub use model::trainer::Trainer;
