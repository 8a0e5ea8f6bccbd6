use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use story_gen_core::io;
use story_gen_core::model::stats::render_table;
use story_gen_core::{NGramConfig, NGramModel, Trainer};

/// Train n-gram story models and generate drafts from them.
#[derive(Parser)]
#[command(name = "story-gen", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Fit models on a corpus (one story per line) and save them.
	Train {
		#[arg(long, default_value = "data/stories.txt")]
		corpus: PathBuf,
		/// Directory receiving `ngram_<n>.bin` files
		#[arg(long, default_value = "models")]
		out: PathBuf,
		/// Train every preset (n = 2, 3, 4, 5) instead of a single model
		#[arg(long)]
		all: bool,
		#[arg(long, default_value_t = 4)]
		n: usize,
		#[arg(long, default_value_t = 3)]
		min_count: u64,
		/// 0 disables top-k truncation
		#[arg(long, default_value_t = 8)]
		top_k: usize,
	},
	/// Generate a draft continuing a story beginning.
	Generate {
		#[arg(long)]
		model: PathBuf,
		#[arg(long, default_value = "")]
		prefix: String,
		#[arg(long, default_value_t = 3)]
		sentences: usize,
		#[arg(long, default_value_t = 80)]
		max_tokens: usize,
		/// Fixed random seed for reproducible drafts
		#[arg(long)]
		seed: Option<u64>,
	},
	/// Generate a draft from every model in a directory.
	Compare {
		#[arg(long, default_value = "models")]
		models: PathBuf,
		#[arg(long)]
		prefix: String,
		#[arg(long, default_value_t = 3)]
		sentences: usize,
		#[arg(long, default_value_t = 80)]
		max_tokens: usize,
	},
	/// Print statistics of every model in a directory.
	Stats {
		#[arg(long, default_value = "models")]
		models: PathBuf,
	},
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	match Cli::parse().command {
		Command::Train { corpus, out, all, n, min_count, top_k } => {
			let configs = if all {
				NGramConfig::presets()
			} else {
				vec![NGramConfig::new(n, min_count, top_k)?]
			};
			train(&corpus, &out, &configs)?;
		}
		Command::Generate { model, prefix, sentences, max_tokens, seed } => {
			let model = io::load_model(&model)?;
			let draft = match seed {
				Some(seed) => model.generate_multi_with_rng(&prefix, sentences, max_tokens, &mut StdRng::seed_from_u64(seed)),
				None => model.generate_multi(&prefix, sentences, max_tokens),
			};
			println!("{draft}");
		}
		Command::Compare { models, prefix, sentences, max_tokens } => {
			for (name, model) in load_all(&models)? {
				println!("\n[{name} draft]:");
				println!("{}", model.generate_multi(&prefix, sentences, max_tokens));
			}
		}
		Command::Stats { models } => {
			let rows: Vec<_> = load_all(&models)?.iter().map(|(_, model)| model.stats()).collect();
			if rows.is_empty() {
				println!("No models loaded. Train n-gram models first.");
			} else {
				println!("\nN-gram model statistics:\n");
				print!("{}", render_table(&rows));
			}
		}
	}

	Ok(())
}

/// Fits one model per configuration on the same corpus and saves each one.
fn train(corpus: &Path, out: &Path, configs: &[NGramConfig]) -> Result<(), Box<dyn std::error::Error>> {
	let stories = io::load_corpus(corpus)?;

	for config in configs {
		info!("training n={} (min_count={}, top_k={})", config.n(), config.min_count(), config.top_k());
		let model = Trainer::new(*config).fit(&stories);
		let path = out.join(io::model_file_name(config.n()));
		io::save_model(&model, &path)?;
		println!("[n={}] saved model to {}", config.n(), path.display());
	}
	Ok(())
}

/// Loads every model of a directory, skipping (with a warning) unreadable ones.
fn load_all(dir: &Path) -> Result<Vec<(String, NGramModel)>, Box<dyn std::error::Error>> {
	let mut models = Vec::new();
	for name in io::list_models(dir)? {
		match io::load_model(io::model_path(dir, &name)) {
			Ok(model) => models.push((name, model)),
			Err(e) => warn!("skipping {name}: {e}"),
		}
	}
	Ok(models)
}
