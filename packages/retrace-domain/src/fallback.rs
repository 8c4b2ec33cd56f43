use crate::window::TimeWindow;

/// Filler words that carry no retrieval signal in a history query.
const STOP_WORDS: &[&str] = &[
	"yesterday",
	"today",
	"last",
	"week",
	"month",
	"looked",
	"visited",
	"viewed",
	"website",
	"site",
	"find",
	"show",
	"search",
	"for",
	"the",
	"and",
	"or",
];

/// Deterministic time-scope detection for when the oracle cannot classify
/// the query. Defaults to `Month`: a 30-day range favors recall over
/// precision when intent is unclear.
pub fn detect_time_window(query: &str) -> TimeWindow {
	let lower = query.to_lowercase();

	if lower.contains("yesterday") {
		TimeWindow::Yesterday
	} else if lower.contains("today") || lower.contains("hours ago") || lower.contains("hour ago") {
		TimeWindow::Today
	} else if lower.contains("last week") || lower.contains("this week") {
		TimeWindow::Week
	} else if lower.contains("last month") || lower.contains("this month") {
		TimeWindow::Month
	} else if lower.contains("all time") || lower.contains("ever") {
		TimeWindow::All
	} else {
		TimeWindow::Month
	}
}

/// Splits the query on whitespace and drops stop words and tokens of two
/// characters or fewer. Original casing is preserved.
pub fn extract_keywords(query: &str) -> Vec<String> {
	query
		.split_whitespace()
		.filter(|word| word.chars().count() > 2)
		.filter(|word| {
			let lower = word.to_lowercase();
			!STOP_WORDS.contains(&lower.as_str())
		})
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_explicit_time_phrases() {
		assert_eq!(detect_time_window("docs I read yesterday"), TimeWindow::Yesterday);
		assert_eq!(detect_time_window("that page from a few hours ago"), TimeWindow::Today);
		assert_eq!(detect_time_window("repos from last week"), TimeWindow::Week);
		assert_eq!(detect_time_window("invoices this month"), TimeWindow::Month);
		assert_eq!(detect_time_window("best recipe I ever saved"), TimeWindow::All);
	}

	#[test]
	fn defaults_to_month_without_time_phrase() {
		assert_eq!(detect_time_window("rust async tutorials"), TimeWindow::Month);
	}

	#[test]
	fn drops_stop_words_and_short_tokens() {
		let keywords = extract_keywords("find the GitHub repo I visited for work");
		assert_eq!(keywords, vec!["GitHub", "repo", "work"]);
	}

	#[test]
	fn empty_query_yields_no_keywords() {
		assert!(extract_keywords("  ").is_empty());
		assert!(extract_keywords("a an of").is_empty());
	}
}
