//! Scriptable fakes for the external collaborators: the oracle, the browser
//! history backend, and the page content extractor.

use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex},
};

use time::OffsetDateTime;

use retrace_providers::{
	BoxFuture,
	extractor::{ContentExtractor, ExtractError, Extracted},
	history::{HistoryEntry, HistoryError, HistoryProvider, HistoryQuery},
	oracle::{
		Availability, OracleError, OracleProvider, OracleResult, OracleSession,
	},
};

/// Oracle that replays a fixed script of responses, one per prompt, across
/// all sessions, and records every prompt it receives.
pub struct ScriptedOracle {
	availability: Availability,
	responses: Arc<Mutex<VecDeque<OracleResult<String>>>>,
	prompts: Arc<Mutex<Vec<String>>>,
}

struct ScriptedSession {
	responses: Arc<Mutex<VecDeque<OracleResult<String>>>>,
	prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOracle {
	pub fn new(availability: Availability, responses: Vec<OracleResult<String>>) -> Self {
		Self {
			availability,
			responses: Arc::new(Mutex::new(responses.into())),
			prompts: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// An available oracle that answers each prompt with the next string.
	pub fn answering(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self::new(
			Availability::Available,
			responses.into_iter().map(|response| Ok(response.into())).collect(),
		)
	}

	/// An available oracle whose every prompt fails.
	pub fn failing() -> Self {
		Self::new(Availability::Available, Vec::new())
	}

	pub fn unavailable() -> Self {
		Self::new(Availability::Unavailable, Vec::new())
	}

	/// Prompts seen so far, in order, including the system instruction of
	/// every session as its first entry.
	pub fn prompts(&self) -> Vec<String> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl OracleProvider for ScriptedOracle {
	fn availability<'a>(&'a self) -> BoxFuture<'a, OracleResult<Availability>> {
		Box::pin(async move { Ok(self.availability) })
	}

	fn create_session<'a>(
		&'a self,
		system_instruction: &'a str,
	) -> BoxFuture<'a, OracleResult<Box<dyn OracleSession>>> {
		Box::pin(async move {
			if !self.availability.is_usable() {
				return Err(OracleError::Unavailable {
					reason: "scripted as unavailable.".to_string(),
				});
			}

			self.prompts
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.push(system_instruction.to_string());

			Ok(Box::new(ScriptedSession {
				responses: self.responses.clone(),
				prompts: self.prompts.clone(),
			}) as Box<dyn OracleSession>)
		})
	}
}

impl OracleSession for ScriptedSession {
	fn prompt<'a>(&'a self, input: &'a str) -> BoxFuture<'a, OracleResult<String>> {
		Box::pin(async move {
			self.prompts.lock().unwrap_or_else(|err| err.into_inner()).push(input.to_string());

			self.responses
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.pop_front()
				.unwrap_or_else(|| {
					Err(OracleError::Attempt {
						message: "response script exhausted.".to_string(),
					})
				})
		})
	}
}

/// In-memory browser history with the backend's matching rules: empty query
/// text matches everything, otherwise any term may hit the title or URL.
pub struct MemoryHistory {
	entries: Vec<HistoryEntry>,
}

impl MemoryHistory {
	pub fn new(entries: Vec<HistoryEntry>) -> Self {
		Self { entries }
	}
}

impl HistoryProvider for MemoryHistory {
	fn search<'a>(
		&'a self,
		query: &'a HistoryQuery,
	) -> BoxFuture<'a, Result<Vec<HistoryEntry>, HistoryError>> {
		Box::pin(async move {
			let terms: Vec<String> =
				query.text.split_whitespace().map(str::to_lowercase).collect();
			let mut matches: Vec<HistoryEntry> = self
				.entries
				.iter()
				.filter(|entry| entry.last_visit >= query.start_time)
				.filter(|entry| {
					terms.is_empty()
						|| terms.iter().any(|term| {
							entry.title.to_lowercase().contains(term)
								|| entry.url.to_lowercase().contains(term)
						})
				})
				.cloned()
				.collect();

			matches.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
			matches.truncate(query.max_results as usize);

			Ok(matches)
		})
	}
}

/// History backend where every lookup fails.
pub struct FailingHistory;

impl HistoryProvider for FailingHistory {
	fn search<'a>(
		&'a self,
		_query: &'a HistoryQuery,
	) -> BoxFuture<'a, Result<Vec<HistoryEntry>, HistoryError>> {
		Box::pin(async move {
			Err(HistoryError { message: "history backend is down.".to_string() })
		})
	}
}

/// Extractor serving canned page content by URL. Unknown URLs fail.
#[derive(Default)]
pub struct StaticExtractor {
	pages: HashMap<String, Extracted>,
}

impl StaticExtractor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_page(
		mut self,
		url: impl Into<String>,
		title: impl Into<String>,
		text: impl Into<String>,
	) -> Self {
		self.pages.insert(
			url.into(),
			Extracted { title: title.into(), text: text.into(), lang: Some("en".to_string()) },
		);

		self
	}
}

impl ContentExtractor for StaticExtractor {
	fn extract<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Extracted, ExtractError>> {
		Box::pin(async move {
			self.pages.get(url).cloned().ok_or_else(|| ExtractError::Failed {
				message: format!("no canned content for {url}."),
			})
		})
	}
}

pub fn entry(url: &str, title: &str, visited_at: OffsetDateTime, visit_count: u32) -> HistoryEntry {
	HistoryEntry {
		url: url.to_string(),
		title: title.to_string(),
		last_visit: visited_at,
		visit_count,
	}
}

/// Default configuration for tests, matching the shipped sample config.
pub fn sample_config() -> retrace_config::Config {
	let payload = "\
[service]
log_level = \"info\"

[oracle]

[search]

[indexing]

[extractor]
";
	let cfg: retrace_config::Config =
		toml::from_str(payload).expect("Sample config must parse.");

	retrace_config::validate(&cfg).expect("Sample config must validate.");

	cfg
}
