use regex::Regex;

/// Pulls `[tag]` tokens out of a memory card.
pub fn extract_tags(memory_card: &str) -> Vec<String> {
	let Ok(re) = Regex::new(r"\[([^\]]+)\]") else {
		return Vec::new();
	};

	re.captures_iter(memory_card).map(|cap| cap[1].to_string()).collect()
}

/// Truncates to at most `max_chars` characters without splitting a code
/// point. Oracle inputs are bounded, not byte-sliced.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}
