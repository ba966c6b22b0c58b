//! Periodic cleanup of completed results.
//!
//! Clears the `result` payload of `COMPLETED` tasks older than the TTL.
//! Status and `status_at` are left as they are.

use std::sync::Arc;
use std::time::Duration;

use stylist_db::store::TaskStore;
use tokio_util::sync::CancellationToken;

/// One sweep. Returns the number of results cleared.
pub async fn sweep_once(tasks: &dyn TaskStore, ttl: Duration) -> Result<u64, sqlx::Error> {
    tasks.clear_results_before(super::cutoff(ttl)).await
}

/// Run the result retention loop until `cancel` is triggered.
pub async fn run(
    tasks: Arc<dyn TaskStore>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = interval.as_secs(),
        "Result retention job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Result retention job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(tasks.as_ref(), ttl).await {
                    Ok(cleared) if cleared > 0 => {
                        tracing::info!(cleared, "Result retention: cleared old results");
                    }
                    Ok(_) => tracing::debug!("Result retention: nothing to clear"),
                    Err(e) => tracing::error!(error = %e, "Result retention: cleanup failed"),
                }
            }
        }
    }
}
