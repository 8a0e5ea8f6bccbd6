use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::model::ngram_model::NGramModel;

/// Extension of persisted model files.
pub const MODEL_EXTENSION: &str = "bin";

/// Reads a corpus file with one story per line.
///
/// - Lines are trimmed
/// - Blank lines are skipped
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
	let path = path.as_ref();
	if !path.exists() {
		return Err(Error::CorpusNotFound(path.to_path_buf()));
	}

	let contents = fs::read_to_string(path)?;
	let stories: Vec<String> = contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_owned)
		.collect();

	info!("loaded {} stories from {}", stories.len(), path.display());
	Ok(stories)
}

/// Writes `model` to `path`, creating parent directories as needed.
pub fn save_model<P: AsRef<Path>>(model: &NGramModel, path: P) -> Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, model.to_bytes()?)?;
	info!("saved n={} model to {}", model.n(), path.display());
	Ok(())
}

/// Reads a model written by [`save_model`].
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<NGramModel> {
	let path = path.as_ref();
	if !path.exists() {
		return Err(Error::ModelNotFound(path.to_path_buf()));
	}
	let model = NGramModel::from_bytes(&fs::read(path)?)?;
	info!("loaded n={} model from {}", model.n(), path.display());
	Ok(model)
}

/// Conventional file name of a model of order `n`.
///
/// Example: `4` → `ngram_4.bin`
pub fn model_file_name(n: usize) -> String {
	format!("ngram_{n}.{MODEL_EXTENSION}")
}

/// Path of the model named `name` inside `dir`.
///
/// Example: `models` + `"ngram_4"` → `models/ngram_4.bin`
pub fn model_path<P: AsRef<Path>>(dir: P, name: &str) -> PathBuf {
	let mut path = dir.as_ref().join(name);
	path.set_extension(MODEL_EXTENSION);
	path
}

/// Lists the names (file stems) of all model files in a directory, sorted.
pub fn list_models<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
	let mut names = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(MODEL_EXTENSION)) {
			if let Some(stem) = path.file_stem() {
				names.push(stem.to_string_lossy().to_string());
			}
		}
	}

	names.sort();
	Ok(names)
}
