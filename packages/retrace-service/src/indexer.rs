use std::sync::Arc;

use futures_util::future::join_all;
use time::{Duration, OffsetDateTime};
use tokio::sync::Semaphore;

use retrace_domain::{text, urls};
use retrace_providers::history::HistoryQuery;
use retrace_store::{PageRecord, PageStatus, make_page_id};

use crate::{RetraceService, ServiceResult};

const SUMMARY_INSTRUCTION: &str = "\
You summarize web pages for a personal browsing index. Reply with two to \
three plain sentences capturing what the page is about and what it offers. \
No markdown, no preamble.";
const MEMORY_CARD_INSTRUCTION: &str = "\
You compress page summaries into memory cards. Reply with one sentence \
followed by bracketed topic tags, like: Helps teams plan and schedule \
social posts. [SaaS][scheduling][social-media]";
const SUMMARY_INPUT_MAX_CHARS: usize = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
	Indexed,
	/// Not enough readable content to summarize.
	Skipped,
	Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
	pub discovered: usize,
	pub queued: usize,
	pub indexed: usize,
	pub skipped: usize,
	pub failed: usize,
}

impl RetraceService {
	/// One indexing cycle: pull recent history into the store, then
	/// summarize a batch of queued pages.
	pub async fn scan_and_index(&self, now: OffsetDateTime) -> ServiceResult<ScanReport> {
		let cfg = &self.cfg.indexing;
		let start = now - Duration::hours(cfg.scan_window_hours as i64);
		let entries = self
			.providers
			.history
			.search(&HistoryQuery {
				text: String::new(),
				start_time: start,
				max_results: cfg.max_history_items,
			})
			.await?;
		let mut report = ScanReport { discovered: entries.len(), ..Default::default() };

		for entry in entries {
			if !urls::is_useful_url(&entry.url) {
				continue;
			}

			let id = make_page_id(&entry.url, entry.last_visit);

			match self.store.get(&id).await? {
				Some(mut record) => {
					record.last_visit = record.last_visit.max(entry.last_visit);
					record.visit_count = record.visit_count.max(entry.visit_count);

					self.store.put(record).await?;
				},
				None => {
					let title = if entry.title.trim().is_empty() {
						entry.url.clone()
					} else {
						entry.title.clone()
					};

					self.store
						.put(PageRecord::queued(&entry.url, &title, entry.last_visit, entry.visit_count))
						.await?;

					report.queued += 1;
				},
			}
		}

		let batch: Vec<PageRecord> = self
			.store
			.list_by_status(PageStatus::Queued)
			.await?
			.into_iter()
			.take(cfg.batch_size as usize)
			.collect();
		// The page workers share the oracle gateway's slots with interactive
		// search; contention is accepted, there are no priority lanes.
		let workers = Arc::new(Semaphore::new(cfg.max_concurrent_pages as usize));
		let outcomes = join_all(batch.into_iter().map(|record| {
			let workers = workers.clone();

			async move {
				let Ok(_permit) = workers.acquire().await else {
					return IndexOutcome::Failed;
				};

				self.process_page(record).await
			}
		}))
		.await;

		for outcome in outcomes {
			match outcome {
				IndexOutcome::Indexed => report.indexed += 1,
				IndexOutcome::Skipped => report.skipped += 1,
				IndexOutcome::Failed => report.failed += 1,
			}
		}

		tracing::info!(
			discovered = report.discovered,
			queued = report.queued,
			indexed = report.indexed,
			skipped = report.skipped,
			failed = report.failed,
			"Indexing cycle finished.",
		);

		Ok(report)
	}

	/// Summarizes one queued page. Failures mark the record `Failed` so the
	/// next cycle does not retry it; the loop always continues.
	pub async fn process_page(&self, mut record: PageRecord) -> IndexOutcome {
		match self.summarize_into(&mut record).await {
			Ok(outcome) => {
				if let Err(err) = self.store.put(record).await {
					tracing::error!(error = %err, "Failed to persist an indexed page.");

					return IndexOutcome::Failed;
				}

				outcome
			},
			Err(err) => {
				tracing::warn!(url = record.url, error = %err, "Page indexing failed.");

				record.status = PageStatus::Failed;

				if let Err(err) = self.store.put(record).await {
					tracing::error!(error = %err, "Failed to persist a failed page record.");
				}

				IndexOutcome::Failed
			},
		}
	}

	async fn summarize_into(&self, record: &mut PageRecord) -> ServiceResult<IndexOutcome> {
		let page = self.providers.extractor.extract(&record.url).await?;

		if !page.title.trim().is_empty() {
			record.title = page.title.clone();
		}

		record.lang = page.lang.clone();

		if page.text.chars().count() < self.cfg.indexing.min_content_chars as usize {
			tracing::debug!(url = record.url, "Too little readable content, not summarizing.");

			record.status = PageStatus::Failed;

			return Ok(IndexOutcome::Skipped);
		}

		let content = text::truncate_chars(&page.text, SUMMARY_INPUT_MAX_CHARS);
		let summary = self
			.oracle_operation(
				SUMMARY_INSTRUCTION,
				&format!("Page title: {}\n\n{content}", record.title),
			)
			.await?;
		let card = self.oracle_operation(MEMORY_CARD_INSTRUCTION, summary.trim()).await?;

		record.tags = text::extract_tags(&card);
		record.summary = Some(summary.trim().to_string());
		record.memory_card = Some(card.trim().to_string());
		record.status = PageStatus::Summarized;

		Ok(IndexOutcome::Indexed)
	}
}

#[cfg(test)]
mod tests {
	use retrace_store::MemoryStore;
	use retrace_testkit::{
		MemoryHistory, ScriptedOracle, StaticExtractor, entry, sample_config,
	};

	use super::*;
	use crate::Providers;

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid timestamp")
	}

	fn long_text() -> String {
		"Publer is a social media management platform that lets teams plan, schedule, \
		 and analyze posts across every major network from one calendar view."
			.to_string()
	}

	fn service(
		oracle: ScriptedOracle,
		history: MemoryHistory,
		extractor: StaticExtractor,
	) -> RetraceService {
		let mut cfg = sample_config();

		cfg.oracle.max_attempts = 1;

		RetraceService::new(
			cfg,
			Arc::new(MemoryStore::new()),
			Providers::new(Arc::new(oracle), Arc::new(history), Arc::new(extractor)),
		)
	}

	#[tokio::test]
	async fn scan_queues_then_summarizes_useful_pages() {
		let visited = now() - Duration::hours(2);
		let history = MemoryHistory::new(vec![
			entry("https://publer.io/", "Publer", visited, 3),
			entry("chrome://extensions", "Extensions", visited, 9),
		]);
		let extractor =
			StaticExtractor::new().with_page("https://publer.io/", "Publer", long_text());
		let oracle = ScriptedOracle::answering([
			"A social media scheduling platform for teams.",
			"Plans and schedules social posts. [SaaS][scheduling]",
		]);
		let service = service(oracle, history, extractor);
		let report = service.scan_and_index(now()).await.expect("scan must succeed");

		assert_eq!(report.discovered, 2);
		assert_eq!(report.queued, 1);
		assert_eq!(report.indexed, 1);
		assert_eq!(report.failed, 0);

		let id = make_page_id("https://publer.io/", visited);
		let record = service
			.store
			.get(&id)
			.await
			.expect("get must succeed")
			.expect("record must exist");

		assert_eq!(record.status, PageStatus::Summarized);
		assert_eq!(record.tags, vec!["SaaS", "scheduling"]);
		assert_eq!(
			record.memory_card.as_deref(),
			Some("Plans and schedules social posts. [SaaS][scheduling]")
		);
		assert_eq!(record.lang.as_deref(), Some("en"));
	}

	#[tokio::test]
	async fn rescan_bumps_visits_without_requeueing() {
		let visited = now() - Duration::hours(2);
		let history = MemoryHistory::new(vec![entry("https://publer.io/", "Publer", visited, 3)]);
		let extractor =
			StaticExtractor::new().with_page("https://publer.io/", "Publer", long_text());
		let oracle = ScriptedOracle::answering([
			"A social media scheduling platform for teams.",
			"Plans and schedules social posts. [SaaS]",
		]);
		let service = service(oracle, history, extractor);

		service.scan_and_index(now()).await.expect("first scan must succeed");

		let second = service.scan_and_index(now()).await.expect("second scan must succeed");

		assert_eq!(second.queued, 0);
		assert_eq!(second.indexed, 0);

		let stats = service.store.stats().await.expect("stats must succeed");

		assert_eq!(stats.total, 1);
		assert_eq!(stats.summarized, 1);
	}

	#[tokio::test]
	async fn thin_pages_are_skipped_and_not_retried() {
		let visited = now() - Duration::hours(1);
		let history = MemoryHistory::new(vec![entry("https://blank.example/page", "Blank", visited, 1)]);
		let extractor =
			StaticExtractor::new().with_page("https://blank.example/page", "Blank", "too short");
		let service = service(ScriptedOracle::failing(), history, extractor);
		let report = service.scan_and_index(now()).await.expect("scan must succeed");

		assert_eq!(report.skipped, 1);

		let id = make_page_id("https://blank.example/page", visited);
		let record = service
			.store
			.get(&id)
			.await
			.expect("get must succeed")
			.expect("record must exist");

		assert_eq!(record.status, PageStatus::Failed);
	}

	#[tokio::test]
	async fn extractor_failure_marks_the_record_failed() {
		let visited = now() - Duration::hours(1);
		let history = MemoryHistory::new(vec![entry("https://gone.example/page", "Gone", visited, 1)]);
		let service =
			service(ScriptedOracle::failing(), history, StaticExtractor::new());
		let report = service.scan_and_index(now()).await.expect("scan must succeed");

		assert_eq!(report.failed, 1);

		let id = make_page_id("https://gone.example/page", visited);
		let record = service
			.store
			.get(&id)
			.await
			.expect("get must succeed")
			.expect("record must exist");

		assert_eq!(record.status, PageStatus::Failed);
	}

	#[tokio::test]
	async fn oracle_failure_marks_the_record_failed() {
		let visited = now() - Duration::hours(1);
		let history = MemoryHistory::new(vec![entry("https://publer.io/", "Publer", visited, 1)]);
		let extractor =
			StaticExtractor::new().with_page("https://publer.io/", "Publer", long_text());
		let service = service(ScriptedOracle::failing(), history, extractor);
		let report = service.scan_and_index(now()).await.expect("scan must succeed");

		assert_eq!(report.failed, 1);
	}
}
