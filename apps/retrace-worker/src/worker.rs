use std::{sync::Arc, time::Duration as StdDuration};

use color_eyre::Result;
use time::OffsetDateTime;
use tokio::time as tokio_time;

use retrace_providers::{
	extractor::HttpExtractor,
	oracle::{Availability, NullOracle},
};
use retrace_service::{Providers, RetraceService};
use retrace_store::{MemoryStore, StoreHistory};

/// Wires the standalone worker: an in-memory store that doubles as the
/// history backend, HTTP page extraction, and no model attached. Swap
/// `NullOracle` for a real provider to light up summarization and
/// semantic ranking; every pipeline degrades cleanly without one.
pub fn build_service(config: retrace_config::Config) -> Result<RetraceService> {
	let store = Arc::new(MemoryStore::new());
	let history = Arc::new(StoreHistory::new(store.clone()));
	let extractor = Arc::new(HttpExtractor::new(&config.extractor)?);

	Ok(RetraceService::new(config, store, Providers::new(Arc::new(NullOracle), history, extractor)))
}

pub async fn run_worker(service: &RetraceService) -> Result<()> {
	let period = StdDuration::from_secs(service.cfg.indexing.scan_interval_minutes as u64 * 60);
	let mut ticker = tokio_time::interval(period);

	ticker.set_missed_tick_behavior(tokio_time::MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;

		if !oracle_ready(service).await {
			tracing::warn!("Oracle is unavailable, skipping this indexing cycle.");

			continue;
		}
		if let Err(err) = service.scan_and_index(OffsetDateTime::now_utc()).await {
			tracing::error!(error = %err, "Indexing cycle failed.");
		}
	}
}

pub async fn scan_once(service: &RetraceService) -> Result<()> {
	if !oracle_ready(service).await {
		tracing::warn!("Oracle is unavailable, not indexing.");

		return Ok(());
	}

	let report = service.scan_and_index(OffsetDateTime::now_utc()).await?;

	tracing::info!(
		discovered = report.discovered,
		queued = report.queued,
		indexed = report.indexed,
		"Scan finished.",
	);

	Ok(())
}

pub async fn search(service: &RetraceService, query: &str) -> Result<()> {
	let response = service.search(query).await;

	println!("{}", serde_json::to_string_pretty(&response)?);

	Ok(())
}

/// Background indexing waits for a fully ready model instead of kicking
/// off a download the way an interactive search may.
async fn oracle_ready(service: &RetraceService) -> bool {
	match service.providers.oracle.availability().await {
		Ok(availability) => availability == Availability::Available,
		Err(err) => {
			tracing::warn!(error = %err, "Oracle availability check failed.");

			false
		},
	}
}
