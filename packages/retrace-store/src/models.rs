use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
	/// Discovered by a scan but not yet summarized.
	Queued,
	Summarized,
	/// Summarization failed; kept so scans do not retry it every cycle.
	Failed,
}

/// One indexed page. Re-visits on the same day collapse into a single
/// record via [`make_page_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
	pub id: String,
	pub url: String,
	pub title: String,
	#[serde(with = "time::serde::rfc3339")]
	pub first_visit: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_visit: OffsetDateTime,
	pub visit_count: u32,
	pub lang: Option<String>,
	pub summary: Option<String>,
	pub memory_card: Option<String>,
	pub tags: Vec<String>,
	pub status: PageStatus,
}

impl PageRecord {
	/// A freshly discovered page, waiting for summarization.
	pub fn queued(url: &str, title: &str, visited_at: OffsetDateTime, visit_count: u32) -> Self {
		Self {
			id: make_page_id(url, visited_at),
			url: url.to_string(),
			title: title.to_string(),
			first_visit: visited_at,
			last_visit: visited_at,
			visit_count,
			lang: None,
			summary: None,
			memory_card: None,
			tags: Vec::new(),
			status: PageStatus::Queued,
		}
	}
}

/// Stable identifier for a URL visited on a given day: the hash input is
/// the URL joined with the visit's day bucket, so the same page seen twice
/// in one day dedupes while a later visit gets a fresh record.
pub fn make_page_id(url: &str, visited_at: OffsetDateTime) -> String {
	let day_bucket = visited_at.unix_timestamp().div_euclid(86_400);

	blake3::hash(format!("{url}_{day_bucket}").as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(unix: i64) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(unix).expect("valid timestamp")
	}

	#[test]
	fn same_day_visits_share_an_id() {
		let morning = at(1_700_000_000);
		let later = morning + time::Duration::hours(3);

		assert_eq!(
			make_page_id("https://publer.io/", morning),
			make_page_id("https://publer.io/", later)
		);
	}

	#[test]
	fn different_days_and_urls_diverge() {
		let day_one = at(1_700_000_000);
		let day_two = day_one + time::Duration::days(1);

		assert_ne!(
			make_page_id("https://publer.io/", day_one),
			make_page_id("https://publer.io/", day_two)
		);
		assert_ne!(
			make_page_id("https://publer.io/", day_one),
			make_page_id("https://publer.io/pricing", day_one)
		);
	}

	#[test]
	fn id_is_hex_and_fixed_width() {
		let id = make_page_id("https://publer.io/", at(1_700_000_000));

		assert_eq!(id.len(), 64);
		assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn queued_records_start_without_content() {
		let record = PageRecord::queued("https://publer.io/", "Publer", at(1_700_000_000), 2);

		assert_eq!(record.status, PageStatus::Queued);
		assert_eq!(record.first_visit, record.last_visit);
		assert!(record.summary.is_none());
		assert!(record.memory_card.is_none());
		assert!(record.tags.is_empty());
	}
}
