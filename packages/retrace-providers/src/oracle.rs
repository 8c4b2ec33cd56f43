use crate::BoxFuture;

pub type OracleResult<T> = Result<T, OracleError>;

/// Whether the on-device model can take prompts right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
	Unavailable,
	/// Usable, but the first session will trigger a model download.
	Downloadable,
	Downloading,
	Available,
}

impl Availability {
	pub fn is_usable(self) -> bool {
		!matches!(self, Self::Unavailable)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
	#[error("Oracle is not available: {reason}")]
	Unavailable { reason: String },
	#[error("Oracle call exceeded {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Oracle output could not be parsed: {message}")]
	MalformedOutput { message: String },
	#[error("Oracle attempt failed: {message}")]
	Attempt { message: String },
}

/// One conversation with the model, primed with a system instruction.
/// Teardown is `Drop`, so a session is released on every exit path,
/// including timeout cancellation mid-prompt.
pub trait OracleSession
where
	Self: Send + Sync,
{
	fn prompt<'a>(&'a self, input: &'a str) -> BoxFuture<'a, OracleResult<String>>;
}

/// A prompt-in, text-out language model. All structure lives in the prompt
/// and the response; callers own parsing and validation.
pub trait OracleProvider
where
	Self: Send + Sync,
{
	fn availability<'a>(&'a self) -> BoxFuture<'a, OracleResult<Availability>>;

	fn create_session<'a>(
		&'a self,
		system_instruction: &'a str,
	) -> BoxFuture<'a, OracleResult<Box<dyn OracleSession>>>;
}

/// Stand-in for environments without a model. Sessions cannot be created,
/// which exercises the deterministic fallback paths downstream.
pub struct NullOracle;

impl OracleProvider for NullOracle {
	fn availability<'a>(&'a self) -> BoxFuture<'a, OracleResult<Availability>> {
		Box::pin(async { Ok(Availability::Unavailable) })
	}

	fn create_session<'a>(
		&'a self,
		_system_instruction: &'a str,
	) -> BoxFuture<'a, OracleResult<Box<dyn OracleSession>>> {
		Box::pin(async {
			Err(OracleError::Unavailable { reason: "no model is installed.".to_string() })
		})
	}
}
