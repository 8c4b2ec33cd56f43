use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub oracle: Oracle,
	pub search: Search,
	pub indexing: Indexing,
	pub extractor: Extractor,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Limits for talking to the on-device language model.
#[derive(Debug, Deserialize)]
pub struct Oracle {
	#[serde(default = "default_max_concurrency")]
	pub max_concurrency: u32,
	#[serde(default = "default_oracle_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Hard cap on the candidate pool handed to the ranker.
	#[serde(default = "default_candidate_limit")]
	pub candidate_limit: u32,
	/// Maximum results returned to the caller.
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	/// Candidates per ranking call.
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	/// Ranked entries below this confidence are dropped.
	#[serde(default = "default_confidence_floor")]
	pub confidence_floor: f32,
	/// Pool size under which single-term supplemental searches kick in.
	#[serde(default = "default_min_pool")]
	pub min_pool: u32,
	#[serde(default = "default_max_supplemental_terms")]
	pub max_supplemental_terms: u32,
	/// Terms joined into the initial broad history search.
	#[serde(default = "default_broad_terms")]
	pub broad_terms: u32,
	/// Expanded terms included in each ranking prompt.
	#[serde(default = "default_context_terms")]
	pub context_terms: u32,
}

#[derive(Debug, Deserialize)]
pub struct Indexing {
	#[serde(default = "default_scan_window_hours")]
	pub scan_window_hours: u32,
	#[serde(default = "default_scan_interval_minutes")]
	pub scan_interval_minutes: u32,
	#[serde(default = "default_indexing_batch_size")]
	pub batch_size: u32,
	#[serde(default = "default_max_concurrent_pages")]
	pub max_concurrent_pages: u32,
	#[serde(default = "default_max_history_items")]
	pub max_history_items: u32,
	/// Pages with less extracted text than this are not summarized.
	#[serde(default = "default_min_content_chars")]
	pub min_content_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Extractor {
	#[serde(default = "default_extractor_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_user_agent")]
	pub user_agent: String,
}

fn default_max_concurrency() -> u32 {
	3
}

fn default_oracle_timeout_ms() -> u64 {
	20_000
}

fn default_max_attempts() -> u32 {
	5
}

fn default_retry_backoff_ms() -> u64 {
	1_500
}

fn default_candidate_limit() -> u32 {
	200
}

fn default_top_k() -> u32 {
	20
}

fn default_batch_size() -> u32 {
	100
}

fn default_confidence_floor() -> f32 {
	0.5
}

fn default_min_pool() -> u32 {
	50
}

fn default_max_supplemental_terms() -> u32 {
	10
}

fn default_broad_terms() -> u32 {
	5
}

fn default_context_terms() -> u32 {
	15
}

fn default_scan_window_hours() -> u32 {
	48
}

fn default_scan_interval_minutes() -> u32 {
	15
}

fn default_indexing_batch_size() -> u32 {
	10
}

fn default_max_concurrent_pages() -> u32 {
	3
}

fn default_max_history_items() -> u32 {
	500
}

fn default_min_content_chars() -> u32 {
	100
}

fn default_extractor_timeout_ms() -> u64 {
	10_000
}

fn default_user_agent() -> String {
	"retrace-indexer/0.2".to_string()
}
