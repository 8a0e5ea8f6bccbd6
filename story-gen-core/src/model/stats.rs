use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;

/// Summary of a fitted model's tables.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelStats {
	pub n: usize,
	pub vocab_size: usize,
	pub total_tokens: u64,
	pub num_contexts: usize,
	/// Mean number of distinct next tokens per stored context (0 if none).
	pub avg_next_per_context: f64,
	/// Largest number of distinct next tokens of any stored context (0 if none).
	pub max_next_per_context: usize,
}

impl ModelStats {
	/// Computes the statistics of `model` without modifying it.
	pub fn from_model(model: &NGramModel) -> Self {
		let num_contexts = model.num_contexts();
		let (total_next, max_next) = model
			.contexts()
			.map(|(_, counts)| counts.len())
			.fold((0usize, 0usize), |(sum, max), len| (sum + len, max.max(len)));

		let avg_next_per_context = if num_contexts > 0 {
			total_next as f64 / num_contexts as f64
		} else {
			0.0
		};

		Self {
			n: model.n(),
			vocab_size: model.vocab().len(),
			total_tokens: model.total_tokens(),
			num_contexts,
			avg_next_per_context,
			max_next_per_context: max_next,
		}
	}
}

const HEADER: [&str; 6] = [
	"n",
	"vocab_size",
	"total_tokens",
	"num_contexts",
	"avg_next_per_context",
	"max_next_per_context",
];

/// Renders statistics of several models as a right-aligned text table.
///
/// The average is printed with two decimals. The header is separated
/// from the rows by a line of dashes.
pub fn render_table(rows: &[ModelStats]) -> String {
	let cells: Vec<[String; 6]> = rows
		.iter()
		.map(|row| {
			[
				row.n.to_string(),
				row.vocab_size.to_string(),
				row.total_tokens.to_string(),
				row.num_contexts.to_string(),
				format!("{:.2}", row.avg_next_per_context),
				row.max_next_per_context.to_string(),
			]
		})
		.collect();

	let mut widths = HEADER.map(str::len);
	for row in &cells {
		for (width, cell) in widths.iter_mut().zip(row) {
			*width = (*width).max(cell.len());
		}
	}

	let mut table = String::new();
	let mut push_row = |values: Vec<String>| {
		let line: Vec<String> = values
			.iter()
			.zip(widths)
			.map(|(value, width)| format!("{value:>width$}"))
			.collect();
		// Writing to a String cannot fail
		let _ = writeln!(table, "{}", line.join("  "));
	};

	push_row(HEADER.iter().map(|h| h.to_string()).collect());
	push_row(widths.iter().map(|&w| "-".repeat(w)).collect());
	for row in cells {
		push_row(row.to_vec());
	}
	table
}
