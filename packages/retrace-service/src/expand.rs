use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use retrace_domain::{fallback, payload, window::TimeWindow};

use crate::{RetraceService, ServiceError, ServiceResult};

const EXPANSION_INSTRUCTION: &str = "\
You expand browsing-history search queries. Reply with a single JSON object \
and nothing else, using these keys: time_window (one of today, yesterday, \
week, two_weeks, month, all), expanded_terms (15 to 25 related words a page \
title or URL might contain), primary_keywords (the essential words from the \
query), intent (one short sentence describing what the user wants to find).";

/// A raw query turned into search terms and a time scope. Produced once per
/// search and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ExpandedQuery {
	pub original_query: String,
	pub time_window: TimeWindow,
	pub expanded_terms: Vec<String>,
	pub primary_keywords: Vec<String>,
	pub intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpansionPayload {
	time_window: Option<String>,
	#[serde(default)]
	expanded_terms: Vec<String>,
	#[serde(default)]
	primary_keywords: Vec<String>,
	intent: Option<String>,
}

impl RetraceService {
	/// Never fails: any oracle trouble degrades to deterministic keyword
	/// extraction and temporal-phrase detection.
	pub async fn expand_query(&self, query: &str) -> ExpandedQuery {
		if !self.oracle_usable().await {
			tracing::debug!(query, "Oracle unusable, expanding with keyword fallback.");

			return fallback_expansion(query);
		}

		match self.expand_with_oracle(query).await {
			Ok(expanded) => expanded,
			Err(err) => {
				tracing::warn!(
					query,
					error = %err,
					"Query expansion failed, using keyword fallback.",
				);

				fallback_expansion(query)
			},
		}
	}

	async fn expand_with_oracle(&self, query: &str) -> ServiceResult<ExpandedQuery> {
		let raw = self
			.oracle_operation(EXPANSION_INSTRUCTION, &format!("Query: \"{query}\""))
			.await?;

		parse_expansion(query, &raw)
	}
}

fn parse_expansion(query: &str, raw: &str) -> ServiceResult<ExpandedQuery> {
	let cleaned = payload::strip_code_fences(raw);
	let parsed: ExpansionPayload = serde_json::from_str(&cleaned)
		.map_err(|err| ServiceError::OracleOutput { message: err.to_string() })?;
	// A missing window means the oracle saw no temporal signal; an unknown
	// label widens the search instead of failing it.
	let time_window = match parsed.time_window.as_deref() {
		None => TimeWindow::Month,
		Some(label) => TimeWindow::parse(label),
	};
	let mut primary_keywords = clean_terms(parsed.primary_keywords);

	if primary_keywords.is_empty() {
		primary_keywords = fallback::extract_keywords(query);
	}

	let mut expanded_terms = clean_terms(parsed.expanded_terms);

	if expanded_terms.is_empty() {
		expanded_terms = primary_keywords.clone();
	}

	Ok(ExpandedQuery {
		original_query: query.to_string(),
		time_window,
		expanded_terms,
		primary_keywords,
		intent: parsed.intent.filter(|intent| !intent.trim().is_empty()),
	})
}

fn clean_terms(terms: Vec<String>) -> Vec<String> {
	let mut seen = HashSet::new();

	terms
		.into_iter()
		.map(|term| term.trim().to_string())
		.filter(|term| !term.is_empty())
		.filter(|term| seen.insert(term.to_lowercase()))
		.collect()
}

pub(crate) fn fallback_expansion(query: &str) -> ExpandedQuery {
	let keywords = fallback::extract_keywords(query);

	ExpandedQuery {
		original_query: query.to_string(),
		time_window: fallback::detect_time_window(query),
		expanded_terms: keywords.clone(),
		primary_keywords: keywords,
		intent: None,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use retrace_store::MemoryStore;
	use retrace_testkit::{MemoryHistory, ScriptedOracle, StaticExtractor, sample_config};

	use super::*;
	use crate::Providers;

	fn service(oracle: Arc<ScriptedOracle>) -> RetraceService {
		let mut cfg = sample_config();

		// Keep failing-oracle tests from sleeping through retry backoff.
		cfg.oracle.max_attempts = 1;

		RetraceService::new(
			cfg,
			Arc::new(MemoryStore::new()),
			Providers::new(
				oracle,
				Arc::new(MemoryHistory::new(Vec::new())),
				Arc::new(StaticExtractor::new()),
			),
		)
	}

	#[tokio::test]
	async fn parses_fenced_oracle_payload() {
		let oracle = Arc::new(ScriptedOracle::answering([
			"```json\n{\"time_window\": \"week\", \"expanded_terms\": [\"scheduling\", \"planner\"], \"primary_keywords\": [\"social\", \"media\"], \"intent\": \"Find a scheduling tool.\"}\n```",
		]));
		let expanded =
			service(oracle.clone()).expand_query("social media tool from last week").await;

		assert_eq!(expanded.time_window, TimeWindow::Week);
		assert_eq!(expanded.expanded_terms, vec!["scheduling", "planner"]);
		assert_eq!(expanded.primary_keywords, vec!["social", "media"]);
		assert_eq!(expanded.intent.as_deref(), Some("Find a scheduling tool."));

		// The instruction asks for a wide expansion; coverage is the point.
		let prompts = oracle.prompts();

		assert!(prompts[0].contains("15 to 25"));
	}

	#[tokio::test]
	async fn missing_window_defaults_to_month_and_unknown_widens_to_all() {
		let oracle = Arc::new(ScriptedOracle::answering([
			"{\"expanded_terms\": [\"rust\"], \"primary_keywords\": [\"rust\"]}",
			"{\"time_window\": \"fortnight\", \"expanded_terms\": [\"rust\"], \"primary_keywords\": [\"rust\"]}",
		]));
		let service = service(oracle);

		assert_eq!(service.expand_query("rust").await.time_window, TimeWindow::Month);
		assert_eq!(service.expand_query("rust").await.time_window, TimeWindow::All);
	}

	#[tokio::test]
	async fn malformed_payload_falls_back_to_keywords() {
		let oracle = Arc::new(ScriptedOracle::answering(["not json at all"]));
		let expanded =
			service(oracle).expand_query("github repo I visited yesterday").await;

		assert_eq!(expanded.time_window, TimeWindow::Yesterday);
		assert_eq!(expanded.primary_keywords, vec!["github", "repo"]);
		assert_eq!(expanded.expanded_terms, vec!["github", "repo"]);
		assert!(expanded.intent.is_none());
	}

	#[tokio::test]
	async fn unavailable_oracle_is_never_prompted() {
		let oracle = Arc::new(ScriptedOracle::unavailable());
		let expanded = service(oracle.clone()).expand_query("pricing page").await;

		assert_eq!(expanded.time_window, TimeWindow::Month);
		assert_eq!(expanded.primary_keywords, vec!["pricing", "page"]);
		assert!(oracle.prompts().is_empty());
	}

	#[tokio::test]
	async fn empty_oracle_lists_fall_back_to_query_terms() {
		let oracle = Arc::new(ScriptedOracle::answering([
			"{\"time_window\": \"today\", \"expanded_terms\": [], \"primary_keywords\": []}",
		]));
		let expanded = service(oracle).expand_query("tokio tutorial").await;

		assert_eq!(expanded.time_window, TimeWindow::Today);
		assert_eq!(expanded.primary_keywords, vec!["tokio", "tutorial"]);
		assert_eq!(expanded.expanded_terms, vec!["tokio", "tutorial"]);
	}

	#[test]
	fn term_cleaning_dedups_case_insensitively() {
		let terms = clean_terms(vec![
			" Publer ".to_string(),
			"publer".to_string(),
			String::new(),
			"scheduler".to_string(),
		]);

		assert_eq!(terms, vec!["Publer", "scheduler"]);
	}
}
