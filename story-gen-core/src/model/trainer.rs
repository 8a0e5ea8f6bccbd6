use std::collections::{BTreeSet, HashMap};

use log::debug;

use super::config::NGramConfig;
use super::counts::Counts;
use super::ngram_model::{BOS, EOS, NGramModel, UNK};
use crate::tokenizer::tokenize;

/// Mutable accumulation state used while fitting an [`NGramModel`].
///
/// The trainer is consumed by [`Trainer::fit`], which returns the frozen
/// model. Nothing can be added to a model after that point.
///
/// # Responsibilities
/// - Count unigrams over the whole corpus (boundaries included)
/// - Replace rare tokens by the unknown symbol using the *global* counts
/// - Count every `(context, next token)` window of the normalized sequences
#[derive(Debug)]
pub struct Trainer {
	config: NGramConfig,
	unigram_counts: Counts,
	context_counts: HashMap<Vec<String>, Counts>,
	total_tokens: u64,
}

impl Trainer {
	/// Creates an empty trainer for the given configuration.
	pub fn new(config: NGramConfig) -> Self {
		Self {
			config,
			unigram_counts: Counts::new(),
			context_counts: HashMap::new(),
			total_tokens: 0,
		}
	}

	/// Trains on `texts` and returns the frozen model.
	///
	/// Two passes are made over the corpus: whether a token is rare enough
	/// to become `<unk>` depends on its count over the *whole* corpus, so
	/// normalization can only start once every text has been counted.
	///
	/// # Notes
	/// - Texts of any length are accepted; a normalized sequence shorter
	///   than `n` still counts toward unigrams and `total_tokens`.
	pub fn fit<S: AsRef<str>>(mut self, texts: &[S]) -> NGramModel {
		for text in texts {
			for token in Self::wrap(text.as_ref()) {
				self.unigram_counts.increment(&token);
			}
		}
		debug!(
			"pass 1: {} texts, {} distinct tokens",
			texts.len(),
			self.unigram_counts.len()
		);

		for text in texts {
			let normalized = self.normalize(Self::wrap(text.as_ref()));
			self.add_sequence(&normalized);
		}
		debug!(
			"pass 2: {} contexts, {} normalized tokens",
			self.context_counts.len(),
			self.total_tokens
		);

		let mut vocab: BTreeSet<String> = self.unigram_counts.tokens().map(str::to_owned).collect();
		vocab.insert(UNK.to_owned());

		NGramModel::from_parts(self.config, self.unigram_counts, self.context_counts, vocab, self.total_tokens)
	}

	/// Tokenizes `text` and surrounds it with the boundary tokens.
	fn wrap(text: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		tokens.push(BOS.to_owned());
		tokens.extend(tokenize(text));
		tokens.push(EOS.to_owned());
		tokens
	}

	/// Replaces every token counted fewer than `min_count` times by `<unk>`.
	fn normalize(&self, tokens: Vec<String>) -> Vec<String> {
		tokens
			.into_iter()
			.map(|token| {
				if self.unigram_counts.get(&token) >= self.config.min_count() {
					token
				} else {
					UNK.to_owned()
				}
			})
			.collect()
	}

	/// Counts every window of width `n` in a normalized sequence.
	fn add_sequence(&mut self, tokens: &[String]) {
		self.total_tokens += tokens.len() as u64;

		let n = self.config.n();
		if tokens.len() < n {
			// Too short to hold a context and its next token
			return;
		}

		for window in tokens.windows(n) {
			let (context, next) = window.split_at(n - 1);
			self.context_counts
				.entry(context.to_vec())
				.or_insert_with(Counts::new)
				.increment(&next[0]);
		}
	}
}
