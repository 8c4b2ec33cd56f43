mod error;
mod history;
mod memory;
mod models;

pub use error::{StoreError, StoreResult};
pub use history::StoreHistory;
pub use memory::MemoryStore;
pub use models::{PageRecord, PageStatus, make_page_id};

use retrace_providers::BoxFuture;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
	pub total: u64,
	pub queued: u64,
	pub summarized: u64,
	pub failed: u64,
}

/// Durable home for indexed pages. Implementations must upsert on `put`:
/// writing an existing id replaces the record.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<PageRecord>>>;

	fn put<'a>(&'a self, record: PageRecord) -> BoxFuture<'a, StoreResult<()>>;

	fn list_by_status<'a>(
		&'a self,
		status: PageStatus,
	) -> BoxFuture<'a, StoreResult<Vec<PageRecord>>>;

	/// Most recently visited records first.
	fn list_recent<'a>(&'a self, limit: u32) -> BoxFuture<'a, StoreResult<Vec<PageRecord>>>;

	fn stats<'a>(&'a self) -> BoxFuture<'a, StoreResult<StoreStats>>;

	fn clear<'a>(&'a self) -> BoxFuture<'a, StoreResult<()>>;
}
