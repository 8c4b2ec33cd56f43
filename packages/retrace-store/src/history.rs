use std::sync::Arc;

use retrace_providers::{
	BoxFuture,
	history::{HistoryEntry, HistoryError, HistoryProvider, HistoryQuery},
};

use crate::RecordStore;

/// Serves history lookups from indexed records, so the search pipeline can
/// run against the store when no live browser history is attached.
pub struct StoreHistory {
	store: Arc<dyn RecordStore>,
}

impl StoreHistory {
	pub fn new(store: Arc<dyn RecordStore>) -> Self {
		Self { store }
	}
}

impl HistoryProvider for StoreHistory {
	fn search<'a>(
		&'a self,
		query: &'a HistoryQuery,
	) -> BoxFuture<'a, Result<Vec<HistoryEntry>, HistoryError>> {
		Box::pin(async move {
			let records = self
				.store
				.list_recent(u32::MAX)
				.await
				.map_err(|err| HistoryError { message: err.to_string() })?;
			let terms: Vec<String> =
				query.text.split_whitespace().map(str::to_lowercase).collect();
			let mut entries: Vec<HistoryEntry> = records
				.into_iter()
				.filter(|record| record.last_visit >= query.start_time)
				.filter(|record| {
					terms.is_empty()
						|| terms.iter().any(|term| {
							record.title.to_lowercase().contains(term)
								|| record.url.to_lowercase().contains(term)
								|| record
									.summary
									.as_deref()
									.is_some_and(|summary| summary.to_lowercase().contains(term))
						})
				})
				.map(|record| HistoryEntry {
					url: record.url,
					title: record.title,
					last_visit: record.last_visit,
					visit_count: record.visit_count,
				})
				.collect();

			entries.truncate(query.max_results as usize);

			Ok(entries)
		})
	}
}
