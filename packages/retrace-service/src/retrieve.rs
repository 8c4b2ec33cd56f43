use std::collections::{HashMap, HashSet};

use serde::Serialize;
use time::OffsetDateTime;

use retrace_domain::urls;
use retrace_providers::history::{HistoryEntry, HistoryQuery};

use crate::{ExpandedQuery, RetraceService, ServiceResult};

/// A history entry scored for one query. Ephemeral; the heuristic score is
/// only consulted again if semantic ranking falls back to keywords.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryCandidate {
	pub url: String,
	pub title: String,
	#[serde(with = "time::serde::rfc3339")]
	pub last_visit: OffsetDateTime,
	pub visit_count: u32,
	pub relevance_score: f32,
	pub match_reason: String,
}

impl RetraceService {
	/// Pulls a deduplicated, scored candidate pool from history. Fails only
	/// when every underlying lookup failed; partial trouble just shrinks
	/// the pool.
	pub async fn retrieve_candidates(
		&self,
		expanded: &ExpandedQuery,
		now: OffsetDateTime,
	) -> ServiceResult<Vec<HistoryCandidate>> {
		let cfg = &self.cfg.search;
		let bounds = expanded.time_window.bounds(now);
		let limit = cfg.candidate_limit as usize;
		let terms = search_terms(expanded);
		let mut pool: HashMap<String, HistoryEntry> = HashMap::new();
		let mut searches = 0usize;
		let mut failures = 0usize;
		let mut last_error = None;
		let broad_text = terms
			.iter()
			.take(cfg.broad_terms as usize)
			.cloned()
			.collect::<Vec<_>>()
			.join(" ");

		searches += 1;

		match self
			.providers
			.history
			.search(&HistoryQuery {
				text: broad_text,
				start_time: bounds.start,
				max_results: cfg.candidate_limit,
			})
			.await
		{
			Ok(entries) => merge_entries(&mut pool, entries),
			Err(err) => {
				tracing::warn!(error = %err, "Broad history search failed.");

				failures += 1;
				last_error = Some(err);
			},
		}

		// A thin pool usually means the joined terms over-constrained the
		// backend; single-term searches loosen it back up.
		if pool.len() < cfg.min_pool as usize {
			let per_search_cap = cfg.candidate_limit.min(50);

			for term in terms
				.iter()
				.filter(|term| term.chars().count() > 2)
				.take(cfg.max_supplemental_terms as usize)
			{
				if pool.len() >= limit {
					break;
				}

				searches += 1;

				match self
					.providers
					.history
					.search(&HistoryQuery {
						text: term.clone(),
						start_time: bounds.start,
						max_results: per_search_cap,
					})
					.await
				{
					Ok(entries) => merge_entries(&mut pool, entries),
					Err(err) => {
						tracing::debug!(term, error = %err, "Supplemental history search failed.");

						failures += 1;
						last_error = Some(err);
					},
				}
			}
		}

		if failures == searches
			&& let Some(err) = last_error
		{
			return Err(err.into());
		}

		let mut candidates: Vec<HistoryCandidate> = pool
			.into_values()
			.filter(|entry| urls::is_useful_url(&entry.url))
			.map(|entry| score_entry(entry, &terms, now))
			.collect();

		candidates.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
		candidates.truncate(limit);

		Ok(candidates)
	}
}

/// Primary keywords first, then expanded terms, deduplicated.
fn search_terms(expanded: &ExpandedQuery) -> Vec<String> {
	let mut seen = HashSet::new();

	expanded
		.primary_keywords
		.iter()
		.chain(expanded.expanded_terms.iter())
		.filter(|term| seen.insert(term.to_lowercase()))
		.cloned()
		.collect()
}

/// First sighting of a URL wins; later duplicates are discarded.
fn merge_entries(pool: &mut HashMap<String, HistoryEntry>, entries: Vec<HistoryEntry>) {
	for entry in entries {
		pool.entry(entry.url.clone()).or_insert(entry);
	}
}

pub(crate) fn score_entry(
	entry: HistoryEntry,
	terms: &[String],
	now: OffsetDateTime,
) -> HistoryCandidate {
	let title = entry.title.to_lowercase();
	let url = entry.url.to_lowercase();
	let mut score = 0.0f32;
	let mut matched: Vec<&str> = Vec::new();

	for term in terms.iter().filter(|term| term.chars().count() > 2) {
		let lower = term.to_lowercase();
		let mut hit = false;

		if title.contains(&lower) {
			score += 10.0;
			hit = true;
		}
		if url.contains(&lower) {
			score += 3.0;
			hit = true;
		}
		if hit {
			matched.push(term);
		}
	}

	let days_ago = (now - entry.last_visit).whole_seconds() as f32 / 86_400.0;

	score += (10.0 - days_ago).max(0.0);
	score += (entry.visit_count as f32 / 5.0).min(10.0);

	let match_reason = if matched.is_empty() {
		"Found in history".to_string()
	} else {
		format!("Found: {}", matched.iter().take(3).copied().collect::<Vec<_>>().join(", "))
	};

	HistoryCandidate {
		url: entry.url,
		title: entry.title,
		last_visit: entry.last_visit,
		visit_count: entry.visit_count,
		relevance_score: score,
		match_reason,
	}
}
