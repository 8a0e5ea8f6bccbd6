use std::collections::{BTreeSet, HashMap, VecDeque};

use log::trace;
use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::config::NGramConfig;
use super::counts::Counts;
use super::stats::ModelStats;
use crate::error::{Error, Result};
use crate::tokenizer::{detokenize, is_sentence_end, tokenize};

/// Start-of-sequence boundary token.
pub const BOS: &str = "<bos>";
/// End-of-sequence boundary token.
pub const EOS: &str = "<eos>";
/// Replacement for tokens rarer than `min_count`.
pub const UNK: &str = "<unk>";

/// A fitted word-level n-gram model with context backoff.
///
/// The model is produced by [`Trainer::fit`](super::trainer::Trainer::fit)
/// and never changes afterwards, so one instance can serve any number of
/// concurrent generations through a shared reference.
///
/// # Responsibilities
/// - Find the next-token distribution of a context, backing off to shorter
///   contexts and finally to the unigram table
/// - Sample the next token with top-k truncation
/// - Generate text from a prefix until enough sentences are complete
///
/// # Invariants
/// - Every key of `context_counts` holds exactly `n - 1` tokens
/// - No stored context has an empty continuation table
/// - `vocab` always contains [`UNK`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	config: NGramConfig,

	/// Raw (non-normalized) token counts over the whole corpus.
	unigram_counts: Counts,

	/// Continuation counts for every observed normalized context.
	context_counts: HashMap<Vec<String>, Counts>,

	vocab: BTreeSet<String>,

	/// Normalized tokens seen in training, boundaries included.
	total_tokens: u64,
}

impl NGramModel {
	/// Returns a model that was never trained.
	///
	/// Sampling from it picks uniformly from its vocabulary, which only
	/// holds the unknown symbol, so it generates empty text.
	pub fn empty(config: NGramConfig) -> Self {
		Self::from_parts(config, Counts::new(), HashMap::new(), BTreeSet::from([UNK.to_owned()]), 0)
	}

	pub(crate) fn from_parts(
		config: NGramConfig,
		unigram_counts: Counts,
		context_counts: HashMap<Vec<String>, Counts>,
		vocab: BTreeSet<String>,
		total_tokens: u64,
	) -> Self {
		Self { config, unigram_counts, context_counts, vocab, total_tokens }
	}

	pub fn config(&self) -> &NGramConfig {
		&self.config
	}

	/// Order of the model.
	pub fn n(&self) -> usize {
		self.config.n()
	}

	pub fn vocab(&self) -> &BTreeSet<String> {
		&self.vocab
	}

	pub fn unigram_counts(&self) -> &Counts {
		&self.unigram_counts
	}

	pub fn total_tokens(&self) -> u64 {
		self.total_tokens
	}

	/// Continuation counts stored for exactly this context, if any.
	pub fn continuations<S: AsRef<str>>(&self, context: &[S]) -> Option<&Counts> {
		let key: Vec<String> = context.iter().map(|token| token.as_ref().to_owned()).collect();
		self.context_counts.get(&key)
	}

	/// Iterates over every stored context and its continuation counts.
	pub fn contexts(&self) -> impl Iterator<Item = (&[String], &Counts)> {
		self.context_counts.iter().map(|(context, counts)| (context.as_slice(), counts))
	}

	/// Number of distinct stored contexts.
	pub fn num_contexts(&self) -> usize {
		self.context_counts.len()
	}

	/// Read-only summary of the learned tables.
	pub fn stats(&self) -> ModelStats {
		ModelStats::from_model(self)
	}

	/// Returns the next-token distribution for `context`.
	///
	/// Trailing sub-contexts are tried from the longest (the whole context)
	/// down to a single token; the first one stored in the table wins.
	/// When none is stored, the unigram table is returned.
	///
	/// # Notes
	/// - Only sub-contexts of exactly `n - 1` tokens can ever be stored, the
	///   other lengths are still looked up and simply miss.
	/// - The result is never empty once the model has seen at least one text.
	pub fn next_dist<S: AsRef<str>>(&self, context: &[S]) -> &Counts {
		let context: Vec<String> = context.iter().map(|token| token.as_ref().to_owned()).collect();
		for k in (1..=context.len()).rev() {
			if let Some(counts) = self.context_counts.get(&context[context.len() - k..]) {
				if k < context.len() {
					trace!("backed off from {} to {} context tokens", context.len(), k);
				}
				return counts;
			}
		}
		trace!("no stored sub-context, using unigram counts");
		&self.unigram_counts
	}

	/// Samples the token following `context`.
	///
	/// - An empty distribution falls back to a uniform pick over the vocabulary.
	/// - `<unk>` is only a candidate when it is the sole continuation.
	/// - Candidates are sorted by descending count, ties keeping first-seen
	///   order, and cut to `top_k` when truncation applies.
	/// - The draw is an integer in `[0, total)` walked over cumulative counts.
	pub fn sample_next<S, R>(&self, context: &[S], rng: &mut R) -> &str
	where
		S: AsRef<str>,
		R: Rng + ?Sized,
	{
		let dist = self.next_dist(context);
		if dist.is_empty() {
			return self.vocab.iter().choose(rng).map_or(UNK, String::as_str);
		}

		let mut candidates: Vec<(&str, u64)> = dist.iter().filter(|&(token, _)| token != UNK).collect();
		if candidates.is_empty() {
			candidates = dist.iter().collect();
		}

		// Stable sort: equal counts stay in first-seen order
		candidates.sort_by(|a, b| b.1.cmp(&a.1));
		let top_k = self.config.top_k();
		if top_k > 0 && candidates.len() > top_k {
			candidates.truncate(top_k);
		}

		let total = candidates.iter().fold(0u64, |sum, (_, count)| sum.saturating_add(*count));
		let mut draw = rng.random_range(0..total);
		for &(token, count) in &candidates {
			if draw < count {
				return token;
			}
			draw -= count;
		}

		// Unreachable while counts are positive
		candidates.last().map_or(UNK, |&(token, _)| token)
	}

	/// Generates up to `num_sentences` sentences following `prefix`.
	///
	/// Uses the thread-local random generator. See
	/// [`NGramModel::generate_multi_with_rng`] for the details.
	pub fn generate_multi(&self, prefix: &str, num_sentences: usize, max_tokens: usize) -> String {
		self.generate_multi_with_rng(prefix, num_sentences, max_tokens, &mut rand::rng())
	}

	/// Generates a single sentence following `prefix`.
	pub fn generate(&self, prefix: &str, max_tokens: usize) -> String {
		self.generate_multi(prefix, 1, max_tokens)
	}

	/// Single-sentence variant of [`NGramModel::generate_multi_with_rng`].
	pub fn generate_with_rng<R: Rng + ?Sized>(&self, prefix: &str, max_tokens: usize, rng: &mut R) -> String {
		self.generate_multi_with_rng(prefix, 1, max_tokens, rng)
	}

	/// Generates text continuing `prefix`, drawing randomness from `rng`.
	///
	/// # Behavior
	/// - A prefix ending with `.`, `!` or `?` is a complete sentence and is
	///   not used as context: generation starts from `<bos>` alone.
	/// - Otherwise the context is `<bos>` followed by the prefix tokens,
	///   left-padded with `<bos>` and cut to its last `n - 1` tokens.
	/// - At most `max_tokens` tokens are sampled. Generation stops early on
	///   `<eos>` or once `num_sentences` sentence-ending tokens were produced.
	///
	/// # Returns
	/// Only the generated continuation (not the prefix), without `<unk>` or
	/// `<bos>` tokens, with punctuation attached to the preceding word.
	pub fn generate_multi_with_rng<R: Rng + ?Sized>(
		&self,
		prefix: &str,
		num_sentences: usize,
		max_tokens: usize,
		rng: &mut R,
	) -> String {
		let mut context = self.initial_context(prefix);
		let mut generated: Vec<String> = Vec::new();
		let mut sentence_count = 0;

		for _ in 0..max_tokens {
			let next = self.sample_next(&*context.make_contiguous(), rng).to_owned();
			if next == EOS {
				break;
			}

			context.pop_front();
			context.push_back(next.clone());
			let ends_sentence = is_sentence_end(&next);
			generated.push(next);

			if ends_sentence {
				sentence_count += 1;
				if sentence_count >= num_sentences {
					break;
				}
			}
		}

		// `<bos>` can be drawn from the unigram fallback
		generated.retain(|token| token != UNK && token != BOS);
		detokenize(&generated)
	}

	/// Builds the `n - 1` token window generation starts from.
	fn initial_context(&self, prefix: &str) -> VecDeque<String> {
		let prefix_tokens = tokenize(prefix);
		let mut tokens = vec![BOS.to_owned()];
		if !prefix_tokens.last().is_some_and(|token| is_sentence_end(token)) {
			tokens.extend(prefix_tokens);
		}

		let width = self.config.context_len();
		let padding = width.saturating_sub(tokens.len());
		let start = tokens.len().saturating_sub(width);

		std::iter::repeat_n(BOS.to_owned(), padding)
			.chain(tokens.into_iter().skip(start))
			.collect()
	}

	/// Encodes the whole model with postcard.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		postcard::to_stdvec(self).map_err(Error::Serialize)
	}

	/// Decodes a model produced by [`NGramModel::to_bytes`].
	///
	/// # Errors
	/// Returns [`Error::Deserialize`] for malformed input, including an order
	/// below 2 or a count table with repeated tokens or zero counts.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		postcard::from_bytes(bytes).map_err(Error::Deserialize)
	}
}
