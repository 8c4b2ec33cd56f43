mod expand;
mod indexer;
mod rank;
mod retrieve;
mod search;

pub use expand::ExpandedQuery;
pub use indexer::{IndexOutcome, ScanReport};
pub use rank::RankedResult;
pub use retrieve::HistoryCandidate;
pub use search::SearchResponse;

use std::sync::Arc;

use retrace_config::Config;
use retrace_providers::{
	extractor::{ContentExtractor, ExtractError},
	gateway::{GatewayError, OracleGateway},
	history::{HistoryError, HistoryProvider},
	oracle::OracleProvider,
};
use retrace_store::{RecordStore, StoreError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error(transparent)]
	Oracle(#[from] GatewayError),
	#[error("Oracle output could not be used: {message}")]
	OracleOutput { message: String },
	#[error(transparent)]
	History(#[from] HistoryError),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Extract(#[from] ExtractError),
}

/// External collaborators, injectable for tests and alternative backends.
#[derive(Clone)]
pub struct Providers {
	pub oracle: Arc<dyn OracleProvider>,
	pub history: Arc<dyn HistoryProvider>,
	pub extractor: Arc<dyn ContentExtractor>,
}

impl Providers {
	pub fn new(
		oracle: Arc<dyn OracleProvider>,
		history: Arc<dyn HistoryProvider>,
		extractor: Arc<dyn ContentExtractor>,
	) -> Self {
		Self { oracle, history, extractor }
	}
}

pub struct RetraceService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub providers: Providers,
	gateway: OracleGateway,
}

impl RetraceService {
	pub fn new(cfg: Config, store: Arc<dyn RecordStore>, providers: Providers) -> Self {
		let gateway = OracleGateway::new(&cfg.oracle);

		Self { cfg, store, providers, gateway }
	}

	/// One gateway-governed oracle round trip. Each attempt opens a fresh
	/// session, prompts once, and tears the session down on the way out.
	pub(crate) async fn oracle_operation(
		&self,
		system_instruction: &str,
		input: &str,
	) -> ServiceResult<String> {
		let oracle = self.providers.oracle.clone();
		let raw = self
			.gateway
			.invoke(|| {
				let oracle = oracle.clone();
				let system_instruction = system_instruction.to_string();
				let input = input.to_string();

				async move {
					let session = oracle.create_session(&system_instruction).await?;

					session.prompt(&input).await
				}
			})
			.await?;

		Ok(raw)
	}

	pub(crate) async fn oracle_usable(&self) -> bool {
		match self.providers.oracle.availability().await {
			Ok(availability) => availability.is_usable(),
			Err(err) => {
				tracing::debug!(error = %err, "Oracle availability check failed.");

				false
			},
		}
	}
}
