//! Word-level tokenizer shared by training and generation.

/// Tokens that close a sentence.
pub const SENTENCE_END: [&str; 3] = [".", "!", "?"];

/// Punctuation that attaches to the preceding word when text is rebuilt.
const ATTACHED_PUNCTUATION: [char; 6] = ['.', '!', '?', ',', ';', ':'];

/// Splits a text into lowercase word tokens.
///
/// - The whole input is lowercased.
/// - `.`, `!` and `?` always become standalone tokens.
/// - Whitespace runs are collapsed; an empty or blank input yields no tokens.
///
/// Other punctuation (commas, quotes, ...) stays glued to its word.
pub fn tokenize(text: &str) -> Vec<String> {
	let mut spaced = String::with_capacity(text.len() + 8);
	for c in text.chars().flat_map(char::to_lowercase) {
		if matches!(c, '.' | '!' | '?') {
			spaced.push(' ');
			spaced.push(c);
			spaced.push(' ');
		} else {
			spaced.push(c);
		}
	}
	spaced.split_whitespace().map(str::to_owned).collect()
}

/// Returns `true` if `token` ends a sentence.
pub fn is_sentence_end(token: &str) -> bool {
	SENTENCE_END.contains(&token)
}

/// Joins tokens back into readable text.
///
/// Tokens are separated by single spaces, except that a token starting
/// with `. ! ? , ; :` is attached to the word before it.
pub fn detokenize<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut text = String::new();
	for token in tokens {
		let token = token.as_ref();
		if !text.is_empty() && !token.starts_with(ATTACHED_PUNCTUATION) {
			text.push(' ');
		}
		text.push_str(token);
	}
	text
}
