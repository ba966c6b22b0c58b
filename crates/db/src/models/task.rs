//! Task entity models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{DbId, TaskId, Timestamp};

/// A row from the `tasks` table joined with its style name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: DbId,
    pub style_id: DbId,
    pub style_name: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: TaskStatus,
    pub start_time: Timestamp,
    pub status_at: Timestamp,
    /// Base64 result image; only present while `COMPLETED` and before the
    /// retention sweep clears it.
    pub result: Option<String>,
}

/// DTO for inserting a new `PENDING` task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub id: TaskId,
    pub owner_id: DbId,
    pub style_id: DbId,
    /// Denormalized for stores that do not join against `styles`.
    pub style_name: String,
}
