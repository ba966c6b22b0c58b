//! Queue consumer pool.
//!
//! Each loop polls the Task Queue every `poll_interval` while idle and
//! drains it while messages are available. Deliveries are at-least-once:
//! [`Worker::handle`] re-reads the task and does nothing unless it is still
//! `PENDING`, so a redelivered message never reaches the transformer twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stylist_core::error_code::ErrorCode;
use stylist_core::messages::TaskEvent;
use stylist_core::task_status::TaskStatus;
use stylist_db::queue::{Delivery, QueueError, TaskQueue};
use stylist_db::store::TaskStore;
use stylist_transformer::{TransformOutcome, TransformRequest, Transformer};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::lifecycle;
use crate::ws::TaskChannelRegistry;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// `PENDING` tasks older than this are canceled without a remote call.
    pub max_time_from_start: Duration,
    pub api_key: String,
    pub poll_interval: Duration,
}

pub struct Worker {
    tasks: Arc<dyn TaskStore>,
    queue: Arc<dyn TaskQueue>,
    transformer: Arc<dyn Transformer>,
    registry: Arc<TaskChannelRegistry>,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        queue: Arc<dyn TaskQueue>,
        transformer: Arc<dyn Transformer>,
        registry: Arc<TaskChannelRegistry>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            tasks,
            queue,
            transformer,
            registry,
            settings,
        }
    }

    /// Run one consumer loop until the cancellation token is triggered.
    pub async fn run(self: Arc<Self>, index: usize, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        tracing::info!(
            worker = index,
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = index, "Worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    while !cancel.is_cancelled() {
                        match self.poll_once().await {
                            Ok(true) => continue,
                            Ok(false) => break,
                            Err(e) => {
                                tracing::error!(worker = index, error = %e, "Queue receive failed");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Claim and process at most one delivery.
    ///
    /// Returns `false` when the queue had nothing visible.
    pub async fn poll_once(&self) -> Result<bool, QueueError> {
        let Some(delivery) = self.queue.receive().await? else {
            return Ok(false);
        };
        let task_id = delivery.message.task_id;

        match self.handle(&delivery).await {
            Ok(()) => {
                if let Err(e) = self.queue.ack(&delivery).await {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to ack delivery");
                }
            }
            Err(e) => {
                tracing::error!(
                    task_id = %task_id,
                    delivery_count = delivery.delivery_count,
                    error = %e,
                    "Task handling failed, releasing delivery",
                );
                self.queue.release(&delivery).await?;
            }
        }
        Ok(true)
    }

    /// Drive one task from `PENDING` to a terminal status.
    async fn handle(&self, delivery: &Delivery) -> Result<(), sqlx::Error> {
        let message = &delivery.message;
        let task_id = message.task_id;

        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            tracing::warn!(task_id = %task_id, "Delivery for unknown task");
            return Ok(());
        };
        if task.status != TaskStatus::Pending {
            tracing::debug!(
                task_id = %task_id,
                status = %task.status,
                delivery_count = delivery.delivery_count,
                "Task no longer pending, skipping delivery",
            );
            return Ok(());
        }

        let expired = chrono::Duration::from_std(self.settings.max_time_from_start)
            .ok()
            .and_then(|max_age| task.start_time.checked_add_signed(max_age))
            .is_some_and(|deadline| Utc::now() > deadline);
        if expired {
            tracing::info!(task_id = %task_id, start_time = %task.start_time, "Task expired before processing");
            if self
                .tasks
                .transition(task_id, &[TaskStatus::Pending], TaskStatus::Canceled)
                .await?
            {
                self.registry.notify(task_id, &TaskEvent::canceled()).await;
            }
            return Ok(());
        }

        if !self
            .tasks
            .transition(task_id, &[TaskStatus::Pending], TaskStatus::Processing)
            .await?
        {
            tracing::debug!(task_id = %task_id, "Lost race to start task");
            return Ok(());
        }
        self.registry.notify(task_id, &TaskEvent::processing()).await;
        tracing::info!(task_id = %task_id, style = %message.style, "Task processing");

        let outcome = self
            .transformer
            .transform(TransformRequest {
                image: message.encoded_image.clone(),
                style: message.style.clone(),
                strength: message.intensity,
                api_key: self.settings.api_key.clone(),
            })
            .await;

        match outcome {
            TransformOutcome::Completed(response) => {
                if self.tasks.complete(task_id, &response.processed_image).await? {
                    tracing::info!(
                        task_id = %task_id,
                        processing_time = response.processing_time,
                        "Task completed",
                    );
                    self.registry
                        .notify(task_id, &TaskEvent::completed(response.processed_image))
                        .await;
                } else {
                    tracing::info!(task_id = %task_id, "Task left PROCESSING meanwhile, result discarded");
                }
            }
            failed => {
                let code = failed.error_code().unwrap_or(ErrorCode::InternalError);
                if let TransformOutcome::Internal(reason) = &failed {
                    tracing::error!(task_id = %task_id, reason = %reason, "Transformer call failed");
                }
                let recorded = lifecycle::fail_task(
                    self.tasks.as_ref(),
                    &self.registry,
                    task_id,
                    &[TaskStatus::Processing],
                    code,
                )
                .await?;
                if recorded {
                    tracing::warn!(task_id = %task_id, code = code.name(), "Task failed");
                }
            }
        }
        Ok(())
    }
}

/// Spawn `concurrency` consumer loops sharing one [`Worker`].
pub fn spawn_pool(
    worker: Arc<Worker>,
    concurrency: usize,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..concurrency)
        .map(|index| tokio::spawn(Arc::clone(&worker).run(index, cancel.clone())))
        .collect()
}
