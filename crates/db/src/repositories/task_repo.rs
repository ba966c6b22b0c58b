//! Repository for the `tasks` table.
//!
//! Every status change is a single conditional `UPDATE` guarded by the set
//! of statuses the task may legally leave, so concurrent workers, sweeps
//! and cancels never overwrite each other's transitions.

use sqlx::PgPool;
use stylist_core::task_status::{StatusId, TaskStatus};
use stylist_core::types::{TaskId, Timestamp};

use crate::models::task::{CreateTask, Task};

/// Column list for `tasks t JOIN styles s` queries.
const COLUMNS: &str = "\
    t.id, t.owner_id, t.style_id, s.name AS style_name, t.status_id, \
    t.start_time, t.status_at, t.result";

/// Provides lifecycle operations for style-transfer tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new `PENDING` task. `start_time` and `status_at` are set by
    /// the database clock.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "WITH t AS ( \
                 INSERT INTO tasks (id, owner_id, style_id, status_id) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING * \
             ) \
             SELECT {COLUMNS} FROM t JOIN styles s ON s.id = t.style_id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.id)
            .bind(input.owner_id)
            .bind(input.style_id)
            .bind(TaskStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: TaskId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks t JOIN styles s ON s.id = t.style_id WHERE t.id = $1"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a task to `to` if its current status is one of `from`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn transition(
        pool: &PgPool,
        id: TaskId,
        from: &[TaskStatus],
        to: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let sources: Vec<StatusId> = to.legal_sources(from).into_iter().map(TaskStatus::id).collect();
        if sources.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE tasks \
             SET status_id = $2, status_at = GREATEST(status_at, NOW()) \
             WHERE id = $1 AND status_id = ANY($3)",
        )
        .bind(id)
        .bind(to.id())
        .bind(&sources)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a `PROCESSING` task as completed with its result payload.
    pub async fn complete(pool: &PgPool, id: TaskId, result: &str) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE tasks \
             SET status_id = $2, status_at = GREATEST(status_at, NOW()), result = $3 \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(TaskStatus::Completed.id())
        .bind(result)
        .bind(TaskStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    /// Cancel every `PROCESSING` task whose last transition is older than
    /// `cutoff`. Returns the IDs that were cancelled.
    pub async fn cancel_stale_processing(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<TaskId>, sqlx::Error> {
        sqlx::query_scalar::<_, TaskId>(
            "UPDATE tasks \
             SET status_id = $1, status_at = GREATEST(status_at, NOW()) \
             WHERE status_id = $2 AND status_at < $3 \
             RETURNING id",
        )
        .bind(TaskStatus::Canceled.id())
        .bind(TaskStatus::Processing.id())
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Drop result payloads of tasks completed before `cutoff`.
    ///
    /// Status and `status_at` are left untouched. Returns the number of
    /// rows cleared.
    pub async fn clear_results_before(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET result = NULL \
             WHERE status_id = $1 AND result IS NOT NULL AND status_at < $2",
        )
        .bind(TaskStatus::Completed.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
