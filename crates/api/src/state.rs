use std::sync::Arc;

use stylist_db::queue::TaskQueue;
use stylist_db::store::{StyleStore, TaskStore};

use crate::config::ServerConfig;
use crate::engine::submission::SubmissionService;
use crate::ws::TaskChannelRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tasks: Arc<dyn TaskStore>,
    pub styles: Arc<dyn StyleStore>,
    pub queue: Arc<dyn TaskQueue>,
    /// Per-task notification channels.
    pub registry: Arc<TaskChannelRegistry>,
    pub submission: Arc<SubmissionService>,
}

impl AppState {
    /// Wire the submission service to the given stores and queue.
    pub fn new(
        config: Arc<ServerConfig>,
        tasks: Arc<dyn TaskStore>,
        styles: Arc<dyn StyleStore>,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<TaskChannelRegistry>,
    ) -> Self {
        let submission = Arc::new(SubmissionService::new(
            Arc::clone(&tasks),
            Arc::clone(&styles),
            Arc::clone(&queue),
            config.pipeline.max_upload_bytes,
            config.pipeline.compression.clone(),
        ));
        Self {
            config,
            tasks,
            styles,
            queue,
            registry,
            submission,
        }
    }
}
