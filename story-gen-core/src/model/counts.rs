use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Occurrence counts for a set of tokens, kept in first-seen order.
///
/// A `Counts` is used both for the unigram table and for the
/// continuation counts of a single context.
///
/// ## Responsibilities:
/// - Accumulate occurrences during training ("get or create, then increment")
/// - Expose entries in the order tokens were first observed
///
/// ## Invariants
/// - Every stored count is strictly positive
/// - `index[token]` is the position of `token` in `entries`
///
/// Only `entries` is serialized; `index` is rebuilt when decoding, and a
/// payload with a repeated token or a zero count is rejected.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<(String, u64)>", into = "Vec<(String, u64)>")]
pub struct Counts {
	/// Tokens and their occurrence counts, in first-seen order.
	entries: Vec<(String, u64)>,
	/// Position of each token in `entries`.
	index: HashMap<String, usize>,
}

impl Counts {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `token`.
	///
	/// - If the token is already present, its count is increased.
	/// - Otherwise it is appended with a count of 1.
	pub fn increment(&mut self, token: &str) {
		match self.index.get(token) {
			Some(&position) => self.entries[position].1 += 1,
			None => {
				self.index.insert(token.to_owned(), self.entries.len());
				self.entries.push((token.to_owned(), 1));
			}
		}
	}

	/// Returns the count of `token`, or 0 if it was never recorded.
	pub fn get(&self, token: &str) -> u64 {
		self.index.get(token).map_or(0, |&position| self.entries[position].1)
	}

	pub fn contains(&self, token: &str) -> bool {
		self.index.contains_key(token)
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sum of all counts (saturating).
	pub fn total(&self) -> u64 {
		self.entries.iter().fold(0u64, |sum, (_, count)| sum.saturating_add(*count))
	}

	/// Iterates over `(token, count)` pairs in first-seen order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.entries.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Iterates over the distinct tokens in first-seen order.
	pub fn tokens(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(token, _)| token.as_str())
	}
}

impl TryFrom<Vec<(String, u64)>> for Counts {
	type Error = String;

	fn try_from(entries: Vec<(String, u64)>) -> Result<Self, Self::Error> {
		let mut index = HashMap::with_capacity(entries.len());
		for (position, (token, count)) in entries.iter().enumerate() {
			if *count == 0 {
				return Err(format!("zero count for token {token:?}"));
			}
			if index.insert(token.clone(), position).is_some() {
				return Err(format!("token {token:?} listed twice"));
			}
		}
		Ok(Self { entries, index })
	}
}

impl From<Counts> for Vec<(String, u64)> {
	fn from(counts: Counts) -> Self {
		counts.entries
	}
}
