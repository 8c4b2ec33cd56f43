use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use retrace_providers::BoxFuture;

use crate::{
	RecordStore, StoreStats,
	error::{StoreError, StoreResult},
	models::{PageRecord, PageStatus},
};

/// Process-local record store. The default backend for tests and for the
/// worker until an embedded database lands.
#[derive(Default)]
pub struct MemoryStore {
	records: Mutex<HashMap<String, PageRecord>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, PageRecord>>> {
		self.records.lock().map_err(|_| StoreError::Poisoned)
	}
}

impl RecordStore for MemoryStore {
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<PageRecord>>> {
		Box::pin(async move { Ok(self.lock()?.get(id).cloned()) })
	}

	fn put<'a>(&'a self, record: PageRecord) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			self.lock()?.insert(record.id.clone(), record);

			Ok(())
		})
	}

	fn list_by_status<'a>(
		&'a self,
		status: PageStatus,
	) -> BoxFuture<'a, StoreResult<Vec<PageRecord>>> {
		Box::pin(async move {
			let mut records: Vec<_> =
				self.lock()?.values().filter(|record| record.status == status).cloned().collect();

			records.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));

			Ok(records)
		})
	}

	fn list_recent<'a>(&'a self, limit: u32) -> BoxFuture<'a, StoreResult<Vec<PageRecord>>> {
		Box::pin(async move {
			let mut records: Vec<_> = self.lock()?.values().cloned().collect();

			records.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
			records.truncate(limit as usize);

			Ok(records)
		})
	}

	fn stats<'a>(&'a self) -> BoxFuture<'a, StoreResult<StoreStats>> {
		Box::pin(async move {
			let records = self.lock()?;
			let mut stats = StoreStats { total: records.len() as u64, ..Default::default() };

			for record in records.values() {
				match record.status {
					PageStatus::Queued => stats.queued += 1,
					PageStatus::Summarized => stats.summarized += 1,
					PageStatus::Failed => stats.failed += 1,
				}
			}

			Ok(stats)
		})
	}

	fn clear<'a>(&'a self) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			self.lock()?.clear();

			Ok(())
		})
	}
}
