//! Handlers for the `/tasks` resource.
//!
//! Submission answers as soon as the task is queued; progress is delivered
//! over the task channel, with `GET /tasks/{id}` as a polling fallback.

use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use stylist_core::error::CoreError;
use stylist_core::error_code::ErrorCode;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{TaskId, Timestamp};
use stylist_db::models::task::Task;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::engine::submission::SubmissionRequest;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a successful submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTask {
    pub task_id: TaskId,
}

/// Current view of a task for its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: TaskId,
    pub status: TaskStatus,
    pub style: String,
    pub start_time: Timestamp,
    pub status_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            status: task.status,
            style: task.style_name,
            start_time: task.start_time,
            status_at: task.status_at,
            result_image: task.result,
        }
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorCode::FileTooLarge.into()
    } else {
        tracing::debug!(error = %e, "Malformed multipart body");
        ErrorCode::InvalidRequest.into()
    }
}

/// Upper bound for the non-file form fields (`style`, `intensity`).
const MAX_TEXT_FIELD_BYTES: usize = 1024;

/// Read a short text field, rejecting anything over
/// [`MAX_TEXT_FIELD_BYTES`] without buffering the rest of it.
async fn read_text_field(mut field: Field<'_>) -> AppResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            tracing::debug!(field = ?field.name(), "Form field exceeds size limit");
            return Err(ErrorCode::InvalidRequest.into());
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| ErrorCode::InvalidRequest.into())
}

/// POST /api/v1/tasks
///
/// Multipart form with `image` (file), `style` and `intensity` fields.
/// Returns 202 with the new task id once the task is queued.
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<SubmittedTask>>)> {
    let max_bytes = state.config.pipeline.max_upload_bytes;

    let mut image: Option<(String, Option<String>, Bytes)> = None;
    let mut style: Option<String> = None;
    let mut intensity_raw: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let mut buf: Vec<u8> = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    if buf.len() + chunk.len() > max_bytes {
                        return Err(ErrorCode::FileTooLarge.into());
                    }
                    buf.extend_from_slice(&chunk);
                }
                image = Some((file_name, content_type, Bytes::from(buf)));
            }
            Some("style") => style = Some(read_text_field(field).await?),
            Some("intensity") => intensity_raw = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let (file_name, content_type, bytes) = image.ok_or(ErrorCode::InvalidRequest)?;
    let style = style
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ErrorCode::InvalidRequest)?;
    let intensity = intensity_raw.and_then(|raw| raw.trim().parse::<f64>().ok());

    let task_id = state
        .submission
        .submit(SubmissionRequest {
            owner_id: user.user_id,
            file_name,
            content_type,
            bytes,
            style,
            intensity,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmittedTask { task_id },
        }),
    ))
}

/// GET /api/v1/tasks/{id}
///
/// Status of a task owned by the caller.
pub async fn get_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let task = find_owned(&state, &user, &raw_id).await?;
    Ok(Json(DataResponse {
        data: TaskView::from(task),
    }))
}

/// POST /api/v1/tasks/{id}/cancel
///
/// Cancel a `PENDING` or `PROCESSING` task. Returns 409 if it already
/// reached a terminal status.
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let task = find_owned(&state, &user, &raw_id).await?;

    let canceled = lifecycle::cancel_task(state.tasks.as_ref(), &state.registry, task.id).await?;
    if !canceled {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Task {} can no longer be canceled",
            task.id
        ))));
    }
    tracing::info!(task_id = %task.id, user_id = user.user_id, "Task canceled over HTTP");

    let task = state
        .tasks
        .find_by_id(task.id)
        .await?
        .ok_or(ErrorCode::TaskNotFound)?;
    Ok(Json(DataResponse {
        data: TaskView::from(task),
    }))
}

async fn find_owned(state: &AppState, user: &AuthUser, raw_id: &str) -> AppResult<Task> {
    let task_id = Uuid::parse_str(raw_id).map_err(|_| ErrorCode::InvalidRequest)?;
    let task = state
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or(ErrorCode::TaskNotFound)?;
    if task.owner_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Task belongs to another user".into(),
        )));
    }
    Ok(task)
}
