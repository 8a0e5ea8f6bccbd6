use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// `(n, min_count, top_k)` for each model trained by a full training run.
///
/// Higher orders see sparser contexts, so they use a stricter
/// unknown-token threshold and a narrower sampling window.
pub const TRAINING_PRESETS: [(usize, u64, usize); 4] = [
	(2, 2, 12),
	(3, 2, 10),
	(4, 3, 8),
	(5, 3, 6),
];

/// Configuration of a backoff n-gram model.
///
/// # Invariants
/// - `n` is always >= 2 (checked by [`NGramConfig::new`])
/// - `top_k == 0` disables top-k truncation
///
/// Decoding goes through the same check, so a stored `n < 2` is rejected.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "RawConfig")]
pub struct NGramConfig {
	/// Order of the model: contexts hold `n - 1` tokens.
	n: usize,

	/// Tokens seen fewer times than this are replaced by the unknown symbol.
	min_count: u64,

	/// Maximum number of candidates considered when sampling (0 = all).
	top_k: usize,
}

impl NGramConfig {
	/// Creates a validated configuration.
	///
	/// # Errors
	/// Returns [`Error::InvalidOrder`] if `n < 2`.
	pub fn new(n: usize, min_count: u64, top_k: usize) -> Result<Self> {
		if n < 2 {
			return Err(Error::InvalidOrder(n));
		}
		Ok(Self { n, min_count, top_k })
	}

	/// Returns the validated configurations of [`TRAINING_PRESETS`].
	pub fn presets() -> Vec<Self> {
		TRAINING_PRESETS
			.iter()
			.map(|&(n, min_count, top_k)| Self { n, min_count, top_k })
			.collect()
	}

	pub fn n(&self) -> usize {
		self.n
	}

	pub fn min_count(&self) -> u64 {
		self.min_count
	}

	pub fn top_k(&self) -> usize {
		self.top_k
	}

	/// Width of every stored context.
	pub fn context_len(&self) -> usize {
		self.n - 1
	}
}

/// Unchecked wire form of [`NGramConfig`].
#[derive(Deserialize)]
struct RawConfig {
	n: usize,
	min_count: u64,
	top_k: usize,
}

impl TryFrom<RawConfig> for NGramConfig {
	type Error = Error;

	fn try_from(raw: RawConfig) -> Result<Self> {
		Self::new(raw.n, raw.min_count, raw.top_k)
	}
}

impl Default for NGramConfig {
	fn default() -> Self {
		Self { n: 4, min_count: 3, top_k: 8 }
	}
}
