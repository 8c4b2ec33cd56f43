use time::OffsetDateTime;

use crate::BoxFuture;

/// Text-plus-range lookup against the browsing history backend.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
	/// Space-separated terms. Empty text matches everything in range.
	pub text: String,
	pub start_time: OffsetDateTime,
	pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
	pub url: String,
	pub title: String,
	pub last_visit: OffsetDateTime,
	pub visit_count: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("History lookup failed: {message}")]
pub struct HistoryError {
	pub message: String,
}

pub trait HistoryProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a HistoryQuery,
	) -> BoxFuture<'a, Result<Vec<HistoryEntry>, HistoryError>>;
}
