use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::Semaphore;

use crate::oracle::{OracleError, OracleResult};

/// Shared throttle in front of every oracle call.
///
/// Bounds concurrency with a semaphore, applies a per-attempt timeout, and
/// retries failed attempts with a linearly growing delay. A permit is held
/// for the whole retry sequence so retries cannot pile extra load onto the
/// model.
pub struct OracleGateway {
	limit: Arc<Semaphore>,
	timeout: Duration,
	max_attempts: u32,
	backoff: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
	#[error("Oracle gave no usable answer after {attempts} attempts.")]
	RetryExhausted {
		attempts: u32,
		#[source]
		last: OracleError,
	},
	#[error("Oracle gateway is closed.")]
	Closed,
}

impl OracleGateway {
	pub fn new(cfg: &retrace_config::Oracle) -> Self {
		Self {
			limit: Arc::new(Semaphore::new(cfg.max_concurrency as usize)),
			timeout: Duration::from_millis(cfg.timeout_ms),
			max_attempts: cfg.max_attempts,
			backoff: Duration::from_millis(cfg.retry_backoff_ms),
		}
	}

	/// Runs `operation` under the gateway's limits. The closure is invoked
	/// once per attempt and must produce a fresh future each time.
	pub async fn invoke<T, F, Fut>(&self, mut operation: F) -> Result<T, GatewayError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = OracleResult<T>>,
	{
		let _permit =
			self.limit.clone().acquire_owned().await.map_err(|_| GatewayError::Closed)?;
		let mut last =
			OracleError::Attempt { message: "no attempt was made.".to_string() };

		for attempt in 1..=self.max_attempts {
			match tokio::time::timeout(self.timeout, operation()).await {
				Ok(Ok(value)) => return Ok(value),
				Ok(Err(err)) => last = err,
				Err(_) => {
					last = OracleError::Timeout { timeout_ms: self.timeout.as_millis() as u64 };
				},
			}

			if attempt < self.max_attempts {
				let delay = self.backoff * attempt;

				tracing::warn!(
					attempt,
					delay_ms = delay.as_millis() as u64,
					error = %last,
					"Oracle attempt failed, retrying.",
				);
				tokio::time::sleep(delay).await;
			}
		}

		Err(GatewayError::RetryExhausted { attempts: self.max_attempts, last })
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use futures_util::future::join_all;
	use tokio::time::Instant;

	use super::*;

	fn gateway(max_concurrency: u32, max_attempts: u32) -> OracleGateway {
		OracleGateway {
			limit: Arc::new(Semaphore::new(max_concurrency as usize)),
			timeout: Duration::from_millis(20_000),
			max_attempts,
			backoff: Duration::from_millis(1_500),
		}
	}

	#[tokio::test]
	async fn first_success_short_circuits() {
		let gateway = gateway(3, 5);
		let calls = AtomicU32::new(0);
		let value = gateway
			.invoke(|| {
				calls.fetch_add(1, Ordering::SeqCst);
				async { Ok::<_, OracleError>(7) }
			})
			.await
			.expect("invoke must succeed");

		assert_eq!(value, 7);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn retries_until_success() {
		let gateway = gateway(3, 5);
		let calls = AtomicU32::new(0);
		let value = gateway
			.invoke(|| {
				let call = calls.fetch_add(1, Ordering::SeqCst);
				async move {
					if call < 2 {
						Err(OracleError::Attempt { message: "flaky".to_string() })
					} else {
						Ok(42)
					}
				}
			})
			.await
			.expect("third attempt must succeed");

		assert_eq!(value, 42);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn exhausts_attempts_and_reports_last_error() {
		let gateway = gateway(3, 5);
		let calls = AtomicU32::new(0);
		let err = gateway
			.invoke(|| {
				calls.fetch_add(1, Ordering::SeqCst);
				async { Err::<(), _>(OracleError::Attempt { message: "down".to_string() }) }
			})
			.await
			.expect_err("all attempts must fail");

		assert_eq!(calls.load(Ordering::SeqCst), 5);

		match err {
			GatewayError::RetryExhausted { attempts, last } => {
				assert_eq!(attempts, 5);
				assert!(last.to_string().contains("down"));
			},
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn backoff_grows_linearly() {
		let gateway = gateway(3, 3);
		let started = Instant::now();
		let _ = gateway
			.invoke(|| async { Err::<(), _>(OracleError::Attempt { message: "down".to_string() }) })
			.await;

		// Delays after the first and second attempts: 1.5 s + 3 s.
		assert_eq!(started.elapsed(), Duration::from_millis(4_500));
	}

	#[tokio::test(start_paused = true)]
	async fn slow_attempts_time_out() {
		let gateway = OracleGateway {
			limit: Arc::new(Semaphore::new(3)),
			timeout: Duration::from_millis(100),
			max_attempts: 2,
			backoff: Duration::from_millis(10),
		};
		let err = gateway
			.invoke(|| async {
				tokio::time::sleep(Duration::from_secs(60)).await;
				Ok::<_, OracleError>(())
			})
			.await
			.expect_err("attempts must time out");

		match err {
			GatewayError::RetryExhausted { last: OracleError::Timeout { timeout_ms }, .. } => {
				assert_eq!(timeout_ms, 100);
			},
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn in_flight_operations_stay_under_the_limit() {
		let gateway = Arc::new(gateway(3, 1));
		let in_flight = Arc::new(AtomicU32::new(0));
		let peak = Arc::new(AtomicU32::new(0));
		let tasks = (0..10).map(|_| {
			let gateway = gateway.clone();
			let in_flight = in_flight.clone();
			let peak = peak.clone();

			tokio::spawn(async move {
				gateway
					.invoke(move || {
						let in_flight = in_flight.clone();
						let peak = peak.clone();

						async move {
							let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;

							peak.fetch_max(now, Ordering::SeqCst);
							tokio::time::sleep(Duration::from_millis(50)).await;
							in_flight.fetch_sub(1, Ordering::SeqCst);

							Ok::<_, OracleError>(())
						}
					})
					.await
					.expect("invoke must succeed");
			})
		});

		join_all(tasks).await;

		assert!(peak.load(Ordering::SeqCst) <= 3, "peak: {}", peak.load(Ordering::SeqCst));
	}
}
