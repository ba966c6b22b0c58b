//! Task Store and Style Store seams.
//!
//! The API crate only talks to these traits; `main` picks the PostgreSQL
//! implementation when `DATABASE_URL` is set and the in-memory one
//! otherwise. Every status change goes through [`TaskStore::transition`] or
//! [`TaskStore::complete`], both of which are compare-and-swap updates.

use async_trait::async_trait;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{TaskId, Timestamp};

use crate::models::style::{Style, StyleSyncSummary};
use crate::models::task::{CreateTask, Task};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStyleStore, MemoryTaskStore};
pub use postgres::{PgStyleStore, PgTaskStore};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new `PENDING` task.
    async fn create(&self, input: &CreateTask) -> Result<Task, sqlx::Error>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, sqlx::Error>;

    /// Move `id` to `to` if its current status is in `from` and the edge is
    /// legal. Returns `false` when nothing was updated.
    async fn transition(
        &self,
        id: TaskId,
        from: &[TaskStatus],
        to: TaskStatus,
    ) -> Result<bool, sqlx::Error>;

    /// `PROCESSING -> COMPLETED`, storing `result`.
    async fn complete(&self, id: TaskId, result: &str) -> Result<bool, sqlx::Error>;

    /// Cancel all `PROCESSING` tasks whose `status_at` is before `cutoff`.
    async fn cancel_stale_processing(&self, cutoff: Timestamp) -> Result<Vec<TaskId>, sqlx::Error>;

    /// Clear results of `COMPLETED` tasks whose `status_at` is before `cutoff`.
    async fn clear_results_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error>;

    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait StyleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Style>, sqlx::Error>;

    async fn list(&self) -> Result<Vec<Style>, sqlx::Error>;

    /// Align the catalogue with the transformer's current style names.
    async fn sync(&self, available: &[String]) -> Result<StyleSyncSummary, sqlx::Error>;
}
