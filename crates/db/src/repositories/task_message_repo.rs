//! Repository for the `task_messages` queue table.
//!
//! Claims use `SELECT FOR UPDATE SKIP LOCKED` so concurrent consumers never
//! receive the same visible message.

use sqlx::{FromRow, PgPool};
use stylist_core::types::TaskId;

/// A claimed row from `task_messages`.
#[derive(Debug, Clone, FromRow)]
pub struct TaskMessageRow {
    pub id: i64,
    pub payload: serde_json::Value,
    pub delivery_count: i32,
}

pub struct TaskMessageRepo;

impl TaskMessageRepo {
    pub async fn insert(
        pool: &PgPool,
        task_id: TaskId,
        payload: &serde_json::Value,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO task_messages (task_id, payload) VALUES ($1, $2) RETURNING id",
        )
        .bind(task_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// Claim the oldest visible message and hide it for
    /// `visibility_timeout_secs`.
    pub async fn claim_next(
        pool: &PgPool,
        visibility_timeout_secs: f64,
    ) -> Result<Option<TaskMessageRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskMessageRow>(
            "UPDATE task_messages \
             SET visible_at = NOW() + make_interval(secs => $1), \
                 delivery_count = delivery_count + 1 \
             WHERE id = ( \
                 SELECT id FROM task_messages \
                 WHERE visible_at <= NOW() \
                 ORDER BY id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, payload, delivery_count",
        )
        .bind(visibility_timeout_secs)
        .fetch_optional(pool)
        .await
    }

    /// Remove a processed message.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_messages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Make a claimed message visible again immediately.
    pub async fn release(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE task_messages SET visible_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
