//! Backoff n-gram language model.
//!
//! This module provides:
//! - Model configuration and training presets (`NGramConfig`)
//! - Two-pass training (`Trainer`)
//! - The frozen, shareable model with backoff sampling (`NGramModel`)
//! - Insertion-ordered count tables (`Counts`)
//! - Read-only statistics (`ModelStats`)

/// Model configuration (`n`, `min_count`, `top_k`) and training presets.
pub mod config;

/// Token count table kept in first-seen order.
///
/// Used for unigram counts and for per-context continuation counts.
pub mod counts;

/// Fitted n-gram model: backoff lookup, top-k sampling and generation.
pub mod ngram_model;

/// Statistics over a fitted model and their tabular rendering.
pub mod stats;

/// Two-pass training producing an immutable `NGramModel`.
pub mod trainer;

#[cfg(test)]
mod tests;
