pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Record store lock was poisoned.")]
	Poisoned,
}
