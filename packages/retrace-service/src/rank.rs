use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use retrace_domain::{payload, urls};

use crate::{ExpandedQuery, HistoryCandidate, RetraceService, ServiceError, ServiceResult};

const RANKING_INSTRUCTION: &str = "\
You rank browsing-history pages by semantic relevance to a query. Reply \
with a JSON array and nothing else, one object per relevant page: \
[{\"index\": 0, \"rank\": 1, \"match_reason\": \"explain the relevance \
clearly\", \"confidence\": 0.95}]. Index is the page's position in the \
input list; rank 1 is the best match. Be strict: omit pages below 0.5 \
confidence.";

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
	pub url: String,
	pub title: String,
	#[serde(with = "time::serde::rfc3339")]
	pub first_visit: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_visit: OffsetDateTime,
	pub visit_count: u32,
	/// Contiguous from 1 in output order.
	pub rank: u32,
	pub match_reason: String,
	/// Present only for oracle-ranked results, always >= the floor.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RankingPayload {
	index: usize,
	rank: u32,
	match_reason: Option<String>,
	confidence: f32,
}

impl RetraceService {
	/// Orders candidates by semantic relevance. Never fails: any oracle
	/// trouble drops the whole ranking to deterministic keyword scoring.
	pub async fn rank_candidates(
		&self,
		query: &str,
		expanded: &ExpandedQuery,
		candidates: &[HistoryCandidate],
	) -> Vec<RankedResult> {
		if candidates.is_empty() {
			return Vec::new();
		}

		match self.rank_with_oracle(query, expanded, candidates).await {
			Ok(ranked) => ranked,
			Err(err) => {
				tracing::warn!(
					query,
					error = %err,
					"Semantic ranking failed, using keyword fallback.",
				);

				keyword_rank(query, expanded, candidates, self.cfg.search.top_k as usize)
			},
		}
	}

	async fn rank_with_oracle(
		&self,
		query: &str,
		expanded: &ExpandedQuery,
		candidates: &[HistoryCandidate],
	) -> ServiceResult<Vec<RankedResult>> {
		let cfg = &self.cfg.search;
		let mut scored: Vec<(usize, u32, RankedResult)> = Vec::new();

		for (batch_index, batch) in candidates.chunks(cfg.batch_size as usize).enumerate() {
			let prompt = ranking_prompt(query, expanded, batch, cfg.context_terms as usize);
			let raw = self.oracle_operation(RANKING_INSTRUCTION, &prompt).await?;

			for item in parse_rankings(&raw)? {
				// The floor applies regardless of how strict the oracle was.
				if item.confidence < cfg.confidence_floor {
					continue;
				}

				let Some(candidate) = batch.get(item.index) else {
					tracing::debug!(batch_index, index = item.index, "Oracle ranked an index out of range.");

					continue;
				};

				scored.push((
					batch_index,
					item.rank,
					RankedResult {
						url: candidate.url.clone(),
						title: candidate.title.clone(),
						first_visit: candidate.last_visit,
						last_visit: candidate.last_visit,
						visit_count: candidate.visit_count,
						rank: 0,
						match_reason: item
							.match_reason
							.filter(|reason| !reason.trim().is_empty())
							.unwrap_or_else(|| "Semantically relevant".to_string()),
						confidence: Some(item.confidence),
					},
				));
			}
		}

		// Batch order first, oracle rank within a batch second; renumbering
		// keeps ranks contiguous even when the oracle returned sparse ones.
		scored.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

		Ok(scored
			.into_iter()
			.enumerate()
			.map(|(idx, (_, _, mut result))| {
				result.rank = idx as u32 + 1;

				result
			})
			.collect())
	}
}

fn ranking_prompt(
	query: &str,
	expanded: &ExpandedQuery,
	batch: &[HistoryCandidate],
	context_terms: usize,
) -> String {
	let page_list = batch
		.iter()
		.enumerate()
		.map(|(idx, candidate)| {
			let host = urls::host_of(&candidate.url);

			if candidate.visit_count > 1 {
				format!("{idx}. {} | {host} [{} visits]", candidate.title, candidate.visit_count)
			} else {
				format!("{idx}. {} | {host}", candidate.title)
			}
		})
		.collect::<Vec<_>>()
		.join("\n");
	let context = if expanded.expanded_terms.is_empty() {
		String::new()
	} else {
		format!(
			"\n\nSearch context (related terms): {}",
			expanded
				.expanded_terms
				.iter()
				.take(context_terms)
				.cloned()
				.collect::<Vec<_>>()
				.join(", ")
		)
	};

	format!(
		"User is looking for: \"{query}\"{context}\n\nHistory pages to rank:\n{page_list}\n\n\
		Rank these pages by semantic relevance. Use domain names to understand site types. \
		Be strict with confidence scores (minimum 0.5). Return only a JSON array."
	)
}

fn parse_rankings(raw: &str) -> ServiceResult<Vec<RankingPayload>> {
	let cleaned = payload::strip_code_fences(raw);

	serde_json::from_str(&cleaned)
		.map_err(|err| ServiceError::OracleOutput { message: err.to_string() })
}

/// Deterministic replacement ranking: literal term matching against titles
/// and URLs, seeded with the retriever's heuristic score.
pub(crate) fn keyword_rank(
	query: &str,
	expanded: &ExpandedQuery,
	candidates: &[HistoryCandidate],
	top_k: usize,
) -> Vec<RankedResult> {
	let query_words: Vec<String> = query
		.to_lowercase()
		.split_whitespace()
		.filter(|word| word.chars().count() > 2)
		.map(str::to_string)
		.collect();
	let expanded_terms: Vec<String> =
		expanded.expanded_terms.iter().map(|term| term.to_lowercase()).collect();
	let mut scored: Vec<(f32, &HistoryCandidate)> = candidates
		.iter()
		.filter_map(|candidate| {
			let title = candidate.title.to_lowercase();
			let url = candidate.url.to_lowercase();
			let mut score = 0.0f32;

			for word in &query_words {
				if title.contains(word) {
					score += 10.0;
				}
				if url.contains(word) {
					score += 5.0;
				}
			}
			for term in &expanded_terms {
				if title.contains(term) {
					score += 8.0;
				}
				if url.contains(term) {
					score += 3.0;
				}
			}

			score += candidate.relevance_score;

			(score > 0.0).then_some((score, candidate))
		})
		.collect();

	scored.sort_by(|a, b| b.0.total_cmp(&a.0));
	scored.truncate(top_k);

	scored
		.into_iter()
		.enumerate()
		.map(|(idx, (score, candidate))| RankedResult {
			url: candidate.url.clone(),
			title: candidate.title.clone(),
			first_visit: candidate.last_visit,
			last_visit: candidate.last_visit,
			visit_count: candidate.visit_count,
			rank: idx as u32 + 1,
			match_reason: if score > 15.0 {
				"Strong keyword match".to_string()
			} else {
				"Related match".to_string()
			},
			confidence: None,
		})
		.collect()
}
