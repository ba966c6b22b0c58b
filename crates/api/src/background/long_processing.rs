//! Watchdog for tasks stuck in `PROCESSING`.
//!
//! Cancels every task whose last transition is older than the maximum
//! processing time and pushes `CANCELED` to its channel.

use std::sync::Arc;
use std::time::Duration;

use stylist_core::messages::TaskEvent;
use stylist_core::types::TaskId;
use stylist_db::store::TaskStore;
use tokio_util::sync::CancellationToken;

use crate::ws::TaskChannelRegistry;

/// One sweep. Returns the ids that were canceled.
pub async fn sweep_once(
    tasks: &dyn TaskStore,
    registry: &TaskChannelRegistry,
    max_processing: Duration,
) -> Result<Vec<TaskId>, sqlx::Error> {
    let canceled = tasks
        .cancel_stale_processing(super::cutoff(max_processing))
        .await?;
    for task_id in &canceled {
        tracing::warn!(task_id = %task_id, "Canceling task stuck in processing");
        registry.notify(*task_id, &TaskEvent::canceled()).await;
    }
    Ok(canceled)
}

/// Run the long-processing sweep until `cancel` is triggered.
pub async fn run(
    tasks: Arc<dyn TaskStore>,
    registry: Arc<TaskChannelRegistry>,
    max_processing: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        max_processing_secs = max_processing.as_secs(),
        interval_secs = interval.as_secs(),
        "Long-processing sweep started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Long-processing sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(tasks.as_ref(), &registry, max_processing).await {
                    Ok(canceled) if !canceled.is_empty() => {
                        tracing::info!(count = canceled.len(), "Long-processing sweep: canceled tasks");
                    }
                    Ok(_) => tracing::debug!("Long-processing sweep: nothing to cancel"),
                    Err(e) => tracing::error!(error = %e, "Long-processing sweep failed"),
                }
            }
        }
    }
}
