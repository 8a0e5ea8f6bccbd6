use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::NGramConfig;
use super::ngram_model::{BOS, EOS, NGramModel, UNK};
use super::trainer::Trainer;
use crate::tokenizer::{is_sentence_end, tokenize};

fn fit(n: usize, min_count: u64, top_k: usize, texts: &[&str]) -> NGramModel {
	Trainer::new(NGramConfig::new(n, min_count, top_k).unwrap()).fit(texts)
}

fn counts_of(model: &NGramModel, context: &[&str]) -> Vec<(String, u64)> {
	model
		.continuations(context)
		.map(|counts| counts.iter().map(|(token, count)| (token.to_owned(), count)).collect())
		.unwrap_or_default()
}

#[test]
fn test_cat_corpus_counts() {
	let model = fit(2, 1, 0, &["the cat sat. the cat ran."]);

	assert_eq!(counts_of(&model, &["the"]), vec![("cat".to_owned(), 2)]);
	assert_eq!(counts_of(&model, &["cat"]), vec![("sat".to_owned(), 1), ("ran".to_owned(), 1)]);
	assert_eq!(counts_of(&model, &["."]), vec![("the".to_owned(), 1), (EOS.to_owned(), 1)]);
	assert!(model.continuations(&["dog"]).is_none());
}

#[test]
fn test_cat_corpus_generation() {
	let model = fit(2, 1, 0, &["the cat sat. the cat ran."]);
	let mut seen = HashSet::new();

	for seed in 0..64 {
		let draft = model.generate_with_rng("the", 10, &mut StdRng::seed_from_u64(seed));
		assert!(draft == "cat sat." || draft == "cat ran.", "unexpected draft {draft:?}");
		seen.insert(draft);
	}

	// Both continuations are equally likely
	assert_eq!(seen.len(), 2);
}

#[test]
fn test_same_seed_same_text() {
	let model = fit(3, 1, 5, &["a b c d. a b d c! c a b?", "d c b a. b b a c."]);
	let a = model.generate_multi_with_rng("a b", 3, 40, &mut StdRng::seed_from_u64(7));
	let b = model.generate_multi_with_rng("a b", 3, 40, &mut StdRng::seed_from_u64(7));
	assert_eq!(a, b);
}

#[test]
fn test_vocab_contains_unk_and_boundaries() {
	let model = fit(2, 1, 0, &["hello world"]);
	for token in [UNK, BOS, EOS, "hello", "world"] {
		assert!(model.vocab().contains(token), "missing {token}");
	}
	assert_eq!(model.vocab().len(), 5);
}

#[test]
fn test_rare_tokens_become_unk() {
	let model = fit(2, 2, 0, &["a b x", "a b y"]);

	// x and y are seen once: they are still in the vocabulary but
	// the context table only knows them as <unk>
	assert!(model.vocab().contains("x"));
	assert_eq!(counts_of(&model, &["b"]), vec![(UNK.to_owned(), 2)]);
	assert_eq!(counts_of(&model, &[UNK]), vec![(EOS.to_owned(), 2)]);
	assert!(model.continuations(&["x"]).is_none());
}

#[test]
fn test_total_tokens_counts_boundaries() {
	let model = fit(3, 2, 0, &["one two three.", "two", ""]);
	// (4 + 2) + (1 + 2) + (0 + 2)
	assert_eq!(model.total_tokens(), 11);
}

#[test]
fn test_short_texts_are_accepted() {
	let model = fit(5, 1, 0, &["hi"]);
	assert_eq!(model.total_tokens(), 3);
	assert_eq!(model.num_contexts(), 0);
	assert_eq!(model.unigram_counts().get("hi"), 1);

	// Every lookup falls back to the unigram table
	let draft = model.generate_multi_with_rng("hi", 1, 5, &mut StdRng::seed_from_u64(1));
	assert!(tokenize(&draft).len() <= 5);
}

#[test]
fn test_next_dist_backs_off_to_stored_suffix() {
	let model = fit(3, 1, 0, &["the cat sat.", "a cat ran."]);

	let dist = model.next_dist(&["something", "the", "cat"]);
	assert_eq!(dist.get("sat"), 1);
	assert_eq!(dist.len(), 1);
}

#[test]
fn test_next_dist_falls_back_to_unigrams() {
	let model = fit(3, 1, 0, &["the cat sat.", "a cat ran."]);

	assert_eq!(model.next_dist(&["never", "seen"]), model.unigram_counts());
	assert_eq!(model.next_dist::<&str>(&[]), model.unigram_counts());
}

#[test]
fn test_sample_skips_unk_when_possible() {
	let model = fit(2, 2, 0, &["a b x", "a b y", "a b"]);
	// ("b",) -> {<unk>: 2, <eos>: 1}
	let mut rng = StdRng::seed_from_u64(3);
	for _ in 0..50 {
		assert_eq!(model.sample_next(&["b"], &mut rng), EOS);
	}
}

#[test]
fn test_sample_keeps_unk_when_alone() {
	let model = fit(2, 2, 0, &["a x .", "a y ."]);
	// ("a",) -> {<unk>: 2}
	let mut rng = StdRng::seed_from_u64(3);
	assert_eq!(model.sample_next(&["a"], &mut rng), UNK);
}

#[test]
fn test_top_k_keeps_most_frequent() {
	let model = fit(2, 1, 1, &["q a", "q b", "q a"]);
	let mut rng = StdRng::seed_from_u64(11);
	for _ in 0..50 {
		assert_eq!(model.sample_next(&["q"], &mut rng), "a");
	}
}

#[test]
fn test_top_k_ties_keep_first_seen_order() {
	let model = fit(2, 1, 1, &["q b", "q a"]);
	let mut rng = StdRng::seed_from_u64(11);
	for _ in 0..50 {
		assert_eq!(model.sample_next(&["q"], &mut rng), "b");
	}
}

#[test]
fn test_empty_model_generates_nothing() {
	let model = NGramModel::empty(NGramConfig::new(3, 1, 0).unwrap());
	assert!(model.vocab().contains(UNK));

	let mut rng = StdRng::seed_from_u64(0);
	assert_eq!(model.sample_next(&["anything"], &mut rng), UNK);
	assert_eq!(model.generate_multi_with_rng("once upon", 3, 20, &mut rng), "");
}

#[test]
fn test_fit_without_texts() {
	let model = fit(2, 1, 0, &[]);
	assert_eq!(model.total_tokens(), 0);
	assert_eq!(model.vocab().len(), 1);
	assert_eq!(model.generate("hello", 10), "");
}

#[test]
fn test_complete_sentence_prefix_is_ignored() {
	let model = fit(2, 1, 0, &["the cat sat. a dog ran.", "a cat sat."]);

	for seed in 0..20 {
		let from_sentence = model.generate_with_rng("The dog sat!", 20, &mut StdRng::seed_from_u64(seed));
		let from_scratch = model.generate_with_rng("", 20, &mut StdRng::seed_from_u64(seed));
		assert_eq!(from_sentence, from_scratch);
	}
}

#[test]
fn test_stops_after_requested_sentences() {
	let model = fit(2, 1, 0, &["a b. a b. a b. a b. a b."]);
	for seed in 0..20 {
		let text = model.generate_multi_with_rng("a", 2, 100, &mut StdRng::seed_from_u64(seed));
		let ends = tokenize(&text).iter().filter(|t| is_sentence_end(t)).count();
		assert!(ends <= 2, "too many sentences in {text:?}");
	}
}

#[test]
fn test_max_tokens_truncates() {
	// No sentence-ending token in the corpus
	let model = fit(2, 1, 0, &["la la la la la la la la"]);
	let text = model.generate_multi_with_rng("la", 1, 4, &mut StdRng::seed_from_u64(5));
	assert!(tokenize(&text).len() <= 4);
	assert!(model.generate_multi_with_rng("la", 1, 0, &mut StdRng::seed_from_u64(5)).is_empty());
}

#[test]
fn test_punctuation_attaches_in_output() {
	let model = fit(2, 1, 0, &["well , fine !"]);
	let text = model.generate_with_rng("well", 10, &mut StdRng::seed_from_u64(2));
	assert_eq!(text, ", fine!");
}

#[test]
fn test_bos_from_unigram_fallback_is_not_emitted() {
	// "zzz" is unseen, so the context backs off to the unigram table,
	// which holds `<bos>`
	let model = fit(2, 1, 0, &["a b."]);
	assert!(model.unigram_counts().contains(BOS));

	for seed in 0..200 {
		let draft = model.generate_multi_with_rng("zzz", 1, 10, &mut StdRng::seed_from_u64(seed));
		assert!(!draft.contains(BOS), "seed {seed} leaked {draft:?}");
	}
}

#[test]
fn test_concurrent_generation_over_shared_model() {
	let model = fit(3, 1, 4, &["the fox ran. the crow flew! the fox slept."]);
	std::thread::scope(|scope| {
		for seed in 0..4 {
			let model = &model;
			scope.spawn(move || {
				let text = model.generate_multi_with_rng("the", 2, 30, &mut StdRng::seed_from_u64(seed));
				assert!(!text.contains(UNK));
			});
		}
	});
}

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec("[abcde .!?]{1,40}", 1..8)
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn contexts_have_width_n_minus_one(texts in corpus_strategy(), n in 2usize..6, min_count in 1u64..3) {
		let model = Trainer::new(NGramConfig::new(n, min_count, 0).unwrap()).fit(&texts);
		for (context, counts) in model.contexts() {
			prop_assert_eq!(context.len(), n - 1);
			prop_assert!(!counts.is_empty());
		}
	}

	#[test]
	fn total_tokens_matches_wrapped_lengths(texts in corpus_strategy(), n in 2usize..6, min_count in 1u64..4) {
		let model = Trainer::new(NGramConfig::new(n, min_count, 0).unwrap()).fit(&texts);
		let expected: u64 = texts.iter().map(|text| tokenize(text).len() as u64 + 2).sum();
		prop_assert_eq!(model.total_tokens(), expected);
	}

	#[test]
	fn vocab_covers_every_raw_token(texts in corpus_strategy(), min_count in 1u64..4) {
		let model = Trainer::new(NGramConfig::new(2, min_count, 0).unwrap()).fit(&texts);

		let mut raw: HashMap<String, u64> = HashMap::new();
		for text in &texts {
			for token in tokenize(text) {
				*raw.entry(token).or_default() += 1;
			}
		}
		for (token, &count) in &raw {
			prop_assert_eq!(model.unigram_counts().get(token), count);
			if count >= min_count {
				prop_assert!(model.vocab().contains(token));
			}
		}

		let mut expected: BTreeSet<String> = raw.into_keys().collect();
		expected.extend([UNK, BOS, EOS].map(str::to_owned));
		prop_assert_eq!(model.vocab(), &expected);
	}

	#[test]
	fn next_dist_is_never_empty(
		texts in corpus_strategy(),
		n in 2usize..5,
		context in prop::collection::vec("[abcdez.]{1,3}", 0..6),
	) {
		let model = Trainer::new(NGramConfig::new(n, 1, 0).unwrap()).fit(&texts);
		prop_assert!(!model.next_dist(&context).is_empty());
	}

	#[test]
	fn generation_is_bounded_and_clean(
		texts in corpus_strategy(),
		n in 2usize..5,
		min_count in 1u64..3,
		top_k in 0usize..4,
		prefix in "[abcdexyz .!?]{0,20}",
		num_sentences in 0usize..4,
		max_tokens in 0usize..30,
		seed in any::<u64>(),
	) {
		let model = Trainer::new(NGramConfig::new(n, min_count, top_k).unwrap()).fit(&texts);
		let mut rng = StdRng::seed_from_u64(seed);
		let text = model.generate_multi_with_rng(&prefix, num_sentences, max_tokens, &mut rng);
		prop_assert!(tokenize(&text).len() <= max_tokens);
		prop_assert!(!text.contains(UNK));
		prop_assert!(!text.contains(EOS));
		prop_assert!(!text.contains(BOS));
	}
}
