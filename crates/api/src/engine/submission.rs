//! Task submission.
//!
//! Validation order: image, intensity, style. Any rejection happens before
//! a task row exists. Once the row exists the task either gets a queue
//! message or is marked `FAILED`.

use std::sync::Arc;

use axum::body::Bytes;
use stylist_core::error_code::ErrorCode;
use stylist_core::imaging::{self, CompressionConfig, Upload};
use stylist_core::messages::SubmissionMessage;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{DbId, TaskId};
use stylist_db::models::task::CreateTask;
use stylist_db::queue::TaskQueue;
use stylist_db::store::{StyleStore, TaskStore};
use uuid::Uuid;

/// A parsed submission form.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub owner_id: DbId,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub style: String,
    /// `None` when the form value was missing or not a number.
    pub intensity: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Rejected with a client-facing code.
    #[error("{}", .0.message())]
    Rejected(ErrorCode),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Image task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ErrorCode> for SubmissionError {
    fn from(code: ErrorCode) -> Self {
        SubmissionError::Rejected(code)
    }
}

/// Whether `value` is an acceptable transfer intensity.
pub fn valid_intensity(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

pub struct SubmissionService {
    tasks: Arc<dyn TaskStore>,
    styles: Arc<dyn StyleStore>,
    queue: Arc<dyn TaskQueue>,
    max_upload_bytes: usize,
    compression: CompressionConfig,
}

impl SubmissionService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        styles: Arc<dyn StyleStore>,
        queue: Arc<dyn TaskQueue>,
        max_upload_bytes: usize,
        compression: CompressionConfig,
    ) -> Self {
        Self {
            tasks,
            styles,
            queue,
            max_upload_bytes,
            compression,
        }
    }

    /// Validate, create and enqueue a task. Returns the new task id.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<TaskId, SubmissionError> {
        let SubmissionRequest {
            owner_id,
            file_name,
            content_type,
            bytes,
            style,
            intensity,
        } = request;

        // Decoding is CPU-bound.
        let max_bytes = self.max_upload_bytes;
        let image = bytes.clone();
        tokio::task::spawn_blocking(move || {
            imaging::validate_upload(
                &Upload {
                    file_name: &file_name,
                    content_type: content_type.as_deref(),
                    bytes: &image,
                },
                max_bytes,
            )
        })
        .await??;

        let intensity = intensity
            .filter(|v| valid_intensity(*v))
            .ok_or(ErrorCode::InvalidIntensity)?;

        let style_row = self.styles.find_by_name(&style).await?.ok_or_else(|| {
            tracing::warn!(style = %style, "Submission rejected: style not found");
            ErrorCode::StyleNotFound
        })?;
        if !style_row.active {
            tracing::warn!(style = %style, "Submission rejected: style not active");
            return Err(ErrorCode::StyleNotSupported.into());
        }

        tracing::info!(
            owner_id,
            style = %style,
            intensity,
            original_bytes = bytes.len(),
            "Starting task submission",
        );

        let compression = self.compression.clone();
        let encoded_image =
            tokio::task::spawn_blocking(move || imaging::prepare_for_transport(&bytes, &compression))
                .await?;

        let task = self
            .tasks
            .create(&CreateTask {
                id: Uuid::new_v4(),
                owner_id,
                style_id: style_row.id,
                style_name: style_row.name.clone(),
            })
            .await?;
        tracing::info!(task_id = %task.id, owner_id, style_id = style_row.id, "Task created");

        let message = SubmissionMessage {
            task_id: task.id,
            encoded_image,
            style: style_row.name,
            intensity,
        };
        if let Err(e) = self.queue.enqueue(&message).await {
            tracing::error!(task_id = %task.id, error = %e, "Failed to enqueue task");
            if let Err(store_err) = self
                .tasks
                .transition(task.id, &[TaskStatus::Pending], TaskStatus::Failed)
                .await
            {
                tracing::error!(
                    task_id = %task.id,
                    queue_error = %e,
                    error = %store_err,
                    "Failed to mark undispatched task as failed; task left PENDING without a message",
                );
            }
            return Err(ErrorCode::QueueDispatchFailed.into());
        }
        tracing::info!(task_id = %task.id, "Task enqueued");

        Ok(task.id)
    }
}
