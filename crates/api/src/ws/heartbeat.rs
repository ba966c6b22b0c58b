use std::sync::Arc;
use std::time::Duration;

use crate::ws::registry::TaskChannelRegistry;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to every open
/// task channel.
///
/// The returned `JoinHandle` is aborted during shutdown.
pub fn start_heartbeat(registry: Arc<TaskChannelRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = registry.connection_count().await;
            tracing::debug!(count, "Task channel heartbeat ping");
            registry.ping_all().await;
        }
    })
}
