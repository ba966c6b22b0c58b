//! In-memory stores for local development and tests.
//!
//! Each operation holds the write lock for its whole read-check-write, which
//! gives the same compare-and-swap semantics as the conditional SQL updates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::{DbId, TaskId, Timestamp};
use tokio::sync::RwLock;

use super::{StyleStore, TaskStore};
use crate::models::style::{plan_sync, Style, StyleSyncSummary};
use crate::models::task::{CreateTask, Task};

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a task's timestamps. Used to simulate elapsed time.
    pub async fn backdate(&self, id: TaskId, start_time: Timestamp, status_at: Timestamp) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) => {
                task.start_time = start_time;
                task.status_at = status_at;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Every stored task, in no particular order.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }
}

fn touch(task: &mut Task, to: TaskStatus) {
    task.status = to;
    task.status_at = task.status_at.max(Utc::now());
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let now = Utc::now();
        let task = Task {
            id: input.id,
            owner_id: input.owner_id,
            style_id: input.style_id,
            style_name: input.style_name.clone(),
            status: TaskStatus::Pending,
            start_time: now,
            status_at: now,
            result: None,
        };
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&input.id) {
            return Err(sqlx::Error::Protocol(format!("duplicate task id {}", input.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, sqlx::Error> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: TaskId,
        from: &[TaskStatus],
        to: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let sources = to.legal_sources(from);
        if sources.is_empty() {
            return Ok(false);
        }
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if sources.contains(&task.status) => {
                touch(task, to);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, id: TaskId, result: &str) -> Result<bool, sqlx::Error> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.status == TaskStatus::Processing => {
                touch(task, TaskStatus::Completed);
                task.result = Some(result.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_stale_processing(&self, cutoff: Timestamp) -> Result<Vec<TaskId>, sqlx::Error> {
        let mut tasks = self.tasks.write().await;
        let mut canceled = Vec::new();
        for task in tasks.values_mut() {
            if task.status == TaskStatus::Processing && task.status_at < cutoff {
                touch(task, TaskStatus::Canceled);
                canceled.push(task.id);
            }
        }
        Ok(canceled)
    }

    async fn clear_results_before(&self, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let mut tasks = self.tasks.write().await;
        let mut cleared = 0;
        for task in tasks.values_mut() {
            if task.status == TaskStatus::Completed
                && task.result.is_some()
                && task.status_at < cutoff
            {
                task.result = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStyleStore {
    styles: RwLock<Vec<Style>>,
}

impl MemoryStyleStore {
    /// Create a catalogue where every name in `names` is active.
    pub fn with_active<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let styles = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Style {
                id: i as DbId + 1,
                name: name.into(),
                active: true,
                created_at: now,
            })
            .collect();
        Self {
            styles: RwLock::new(styles),
        }
    }

    pub async fn set_active(&self, name: &str, active: bool) -> bool {
        let mut styles = self.styles.write().await;
        match styles.iter_mut().find(|s| s.name == name) {
            Some(style) => {
                style.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl StyleStore for MemoryStyleStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Style>, sqlx::Error> {
        let styles = self.styles.read().await;
        Ok(styles.iter().find(|s| s.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<Style>, sqlx::Error> {
        let mut styles = self.styles.read().await.clone();
        styles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(styles)
    }

    async fn sync(&self, available: &[String]) -> Result<StyleSyncSummary, sqlx::Error> {
        let mut styles = self.styles.write().await;
        let plan = plan_sync(&styles, available);

        let mut next_id = styles.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        for name in &plan.insert {
            styles.push(Style {
                id: next_id,
                name: name.clone(),
                active: true,
                created_at: now,
            });
            next_id += 1;
        }
        for style in styles.iter_mut() {
            if plan.activate.contains(&style.id) {
                style.active = true;
            } else if plan.deactivate.contains(&style.id) {
                style.active = false;
            }
        }
        Ok(StyleSyncSummary::from(&plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn new_task(id: TaskId) -> CreateTask {
        CreateTask {
            id,
            owner_id: 7,
            style_id: 1,
            style_name: "mosaic".into(),
        }
    }

    #[tokio::test]
    async fn transition_is_conditional() {
        let store = MemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.create(&new_task(id)).await.unwrap();

        let moved = store
            .transition(id, &[TaskStatus::Pending], TaskStatus::Processing)
            .await
            .unwrap();
        assert!(moved);

        // Already PROCESSING, so a second PENDING -> PROCESSING loses.
        let again = store
            .transition(id, &[TaskStatus::Pending], TaskStatus::Processing)
            .await
            .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn terminal_tasks_never_move() {
        let store = MemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.create(&new_task(id)).await.unwrap();
        store
            .transition(id, &[TaskStatus::Pending], TaskStatus::Canceled)
            .await
            .unwrap();

        let moved = store
            .transition(
                id,
                &[TaskStatus::Canceled, TaskStatus::Pending],
                TaskStatus::Processing,
            )
            .await
            .unwrap();
        assert!(!moved);
        assert!(!store.complete(id, "abc").await.unwrap());

        let task = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Canceled);
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn status_at_never_moves_backwards() {
        let store = MemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.create(&new_task(id)).await.unwrap();
        let future = Utc::now() + Duration::hours(1);
        store.backdate(id, Utc::now(), future).await;

        store
            .transition(id, &[TaskStatus::Pending], TaskStatus::Processing)
            .await
            .unwrap();
        let task = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.status_at, future);
    }

    #[tokio::test]
    async fn stale_sweep_only_touches_old_processing() {
        let store = MemoryTaskStore::new();
        let old = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let pending = Uuid::new_v4();
        for id in [old, fresh, pending] {
            store.create(&new_task(id)).await.unwrap();
        }
        for id in [old, fresh] {
            store
                .transition(id, &[TaskStatus::Pending], TaskStatus::Processing)
                .await
                .unwrap();
        }
        let long_ago = Utc::now() - Duration::minutes(10);
        store.backdate(old, long_ago, long_ago).await;
        store.backdate(pending, long_ago, long_ago).await;

        let canceled = store
            .cancel_stale_processing(Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(canceled, vec![old]);

        let pending_task = store.find_by_id(pending).await.unwrap().unwrap();
        assert_eq!(pending_task.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn retention_clears_result_but_keeps_status() {
        let store = MemoryTaskStore::new();
        let id = Uuid::new_v4();
        store.create(&new_task(id)).await.unwrap();
        store
            .transition(id, &[TaskStatus::Pending], TaskStatus::Processing)
            .await
            .unwrap();
        store.complete(id, "cmVzdWx0").await.unwrap();
        let long_ago = Utc::now() - Duration::hours(2);
        store.backdate(id, long_ago, long_ago).await;

        let cleared = store
            .clear_results_before(Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(cleared, 1);

        let task = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.status_at, long_ago);
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn style_sync_inserts_and_flips() {
        let store = MemoryStyleStore::with_active(["mosaic", "scream"]);
        let summary = store
            .sync(&["mosaic".to_string(), "candy".to_string()])
            .await
            .unwrap();
        assert_eq!(
            summary,
            StyleSyncSummary {
                inserted: 1,
                activated: 0,
                deactivated: 1,
            }
        );
        let scream = store.find_by_name("scream").await.unwrap().unwrap();
        assert!(!scream.active);
        let candy = store.find_by_name("candy").await.unwrap().unwrap();
        assert!(candy.active);
        assert_eq!(candy.id, 3);
    }
}
