use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Symbolic time scope attached to a query.
///
/// `Yesterday` resolves from "now", not from a calendar-day boundary, so its
/// range is the last 48 hours and overlaps `Today`. Recall beats calendar
/// precision here; callers that want strict calendar days must slice the
/// range themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
	Today,
	Yesterday,
	Week,
	TwoWeeks,
	Month,
	All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
	pub start: OffsetDateTime,
	pub end: OffsetDateTime,
}

impl TimeWindow {
	/// Maps a label to a window. Unknown labels resolve to `All` so a bad
	/// oracle classification widens the search instead of failing it.
	pub fn parse(label: &str) -> Self {
		match label.trim() {
			"today" => Self::Today,
			"yesterday" => Self::Yesterday,
			"week" => Self::Week,
			"two_weeks" => Self::TwoWeeks,
			"month" => Self::Month,
			_ => Self::All,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Today => "today",
			Self::Yesterday => "yesterday",
			Self::Week => "week",
			Self::TwoWeeks => "two_weeks",
			Self::Month => "month",
			Self::All => "all",
		}
	}

	/// Resolves the half-open `[start, end)` range for this window, with
	/// `end` pinned to the supplied `now`.
	pub fn bounds(self, now: OffsetDateTime) -> WindowBounds {
		let start = match self {
			Self::Today => now - Duration::hours(24),
			Self::Yesterday => now - Duration::hours(48),
			Self::Week => now - Duration::days(7),
			Self::TwoWeeks => now - Duration::days(14),
			Self::Month => now - Duration::days(30),
			Self::All => OffsetDateTime::UNIX_EPOCH,
		};

		WindowBounds { start, end: now }
	}
}
