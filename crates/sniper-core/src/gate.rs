//! Sale start gate.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time left until `start_timestamp` (Unix seconds), zero if it has passed.
pub fn wait_duration(start_timestamp: u64, now: Duration) -> Duration {
	Duration::from_secs(start_timestamp).saturating_sub(now)
}

/// Sleeps until the sale opens. Returns immediately if it already has.
pub async fn wait_until_sale_start(start_timestamp: u64) {
	let now = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default();
	let wait = wait_duration(start_timestamp, now);

	if wait.is_zero() {
		tracing::info!(start_timestamp, "Sale already open");
		return;
	}

	tracing::info!(
		start_timestamp,
		wait_secs = wait.as_secs_f64(),
		"Waiting for sale start"
	);
	tokio::time::sleep(wait).await;
}
