use std::io;
use std::path::PathBuf;

/// Errors raised by the story generation library.
///
/// Model-level code only ever fails with `InvalidOrder`; every other
/// variant comes from corpus loading or model persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("n must be >= 2 for an n-gram model, got {0}")]
	InvalidOrder(usize),

	#[error("corpus not found: {}", .0.display())]
	CorpusNotFound(PathBuf),

	#[error("model file not found: {}", .0.display())]
	ModelNotFound(PathBuf),

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("serialization error: {0}")]
	Serialize(postcard::Error),

	#[error("deserialization error: {0}")]
	Deserialize(postcard::Error),
}

/// Library-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
