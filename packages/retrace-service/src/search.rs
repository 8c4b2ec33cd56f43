use serde::Serialize;
use time::OffsetDateTime;

use retrace_domain::{urls, window::TimeWindow};
use retrace_providers::history::HistoryQuery;

use crate::{ExpandedQuery, RankedResult, RetraceService, ServiceResult, expand, retrieve};

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub query: String,
	pub expanded: ExpandedQuery,
	pub results: Vec<RankedResult>,
	/// True when the pipeline itself failed and the last-resort keyword
	/// path produced the results.
	pub degraded: bool,
}

impl RetraceService {
	/// Full pipeline: expand, retrieve, rank, truncate. Never fails; the
	/// worst case is an empty result list.
	pub async fn search(&self, query: &str) -> SearchResponse {
		self.search_at(query, OffsetDateTime::now_utc()).await
	}

	pub async fn search_at(&self, query: &str, now: OffsetDateTime) -> SearchResponse {
		match self.try_search(query, now).await {
			Ok(response) => response,
			Err(err) => {
				tracing::error!(
					query,
					error = %err,
					"Search pipeline failed, running last-resort keyword search.",
				);

				self.last_resort(query, now).await
			},
		}
	}

	async fn try_search(&self, query: &str, now: OffsetDateTime) -> ServiceResult<SearchResponse> {
		let top_k = self.cfg.search.top_k as usize;
		let expanded = self.expand_query(query).await;

		tracing::debug!(
			query,
			window = expanded.time_window.label(),
			terms = expanded.expanded_terms.len(),
			"Query expanded.",
		);

		let candidates = self.retrieve_candidates(&expanded, now).await?;

		if candidates.is_empty() {
			tracing::debug!(query, "No candidates in range, returning an empty result.");

			return Ok(SearchResponse {
				query: query.to_string(),
				expanded,
				results: Vec::new(),
				degraded: false,
			});
		}

		let mut results = self.rank_candidates(query, &expanded, &candidates).await;

		results.truncate(top_k);

		Ok(SearchResponse { query: query.to_string(), expanded, results, degraded: false })
	}

	/// Catch-all for a pipeline that failed outright: a plain keyword
	/// lookup over the last month, mapped positionally into results.
	async fn last_resort(&self, query: &str, now: OffsetDateTime) -> SearchResponse {
		let top_k = self.cfg.search.top_k as usize;
		let expanded = expand::fallback_expansion(query);
		let words: Vec<String> = query
			.split_whitespace()
			.filter(|word| word.chars().count() > 2)
			.map(str::to_string)
			.collect();
		let bounds = TimeWindow::Month.bounds(now);
		let entries = match self
			.providers
			.history
			.search(&HistoryQuery {
				text: words.join(" "),
				start_time: bounds.start,
				max_results: 50,
			})
			.await
		{
			Ok(entries) => entries,
			Err(err) => {
				tracing::error!(query, error = %err, "Last-resort history search failed.");

				Vec::new()
			},
		};
		// Positional ranks follow the heuristic score, not the backend's
		// recency order.
		let mut candidates: Vec<_> = entries
			.into_iter()
			.filter(|entry| urls::is_useful_url(&entry.url))
			.map(|entry| retrieve::score_entry(entry, &words, now))
			.collect();

		candidates.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

		let results = candidates
			.into_iter()
			.take(top_k)
			.enumerate()
			.map(|(idx, candidate)| RankedResult {
				url: candidate.url,
				title: candidate.title,
				first_visit: candidate.last_visit,
				last_visit: candidate.last_visit,
				visit_count: candidate.visit_count,
				rank: idx as u32 + 1,
				match_reason: "Keyword match (search degraded)".to_string(),
				confidence: None,
			})
			.collect();

		SearchResponse { query: query.to_string(), expanded, results, degraded: true }
	}
}
