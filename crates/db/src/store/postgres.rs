//! PostgreSQL-backed stores delegating to the repository layer.

use async_trait::async_trait;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{TaskId, Timestamp};

use super::{StyleStore, TaskStore};
use crate::models::style::{Style, StyleSyncSummary};
use crate::models::task::{CreateTask, Task};
use crate::repositories::{StyleRepo, TaskRepo};
use crate::DbPool;

#[derive(Clone)]
pub struct PgTaskStore {
    pool: DbPool,
}

impl PgTaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, input: &CreateTask) -> Result<Task, sqlx::Error> {
        TaskRepo::create(&self.pool, input).await
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, sqlx::Error> {
        TaskRepo::find_by_id(&self.pool, id).await
    }

    async fn transition(
        &self,
        id: TaskId,
        from: &[TaskStatus],
        to: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        TaskRepo::transition(&self.pool, id, from, to).await
    }

    async fn complete(&self, id: TaskId, result: &str) -> Result<bool, sqlx::Error> {
        TaskRepo::complete(&self.pool, id, result).await
    }

    async fn cancel_stale_processing(&self, cutoff: Timestamp) -> Result<Vec<TaskId>, sqlx::Error> {
        TaskRepo::cancel_stale_processing(&self.pool, cutoff).await
    }

    async fn clear_results_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        TaskRepo::clear_results_before(&self.pool, cutoff).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}

#[derive(Clone)]
pub struct PgStyleStore {
    pool: DbPool,
}

impl PgStyleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StyleStore for PgStyleStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Style>, sqlx::Error> {
        StyleRepo::find_by_name(&self.pool, name).await
    }

    async fn list(&self) -> Result<Vec<Style>, sqlx::Error> {
        StyleRepo::list(&self.pool).await
    }

    async fn sync(&self, available: &[String]) -> Result<StyleSyncSummary, sqlx::Error> {
        StyleRepo::sync(&self.pool, available).await
    }
}
