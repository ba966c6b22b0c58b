use stylist_core::error_code::ErrorCode;
use stylist_core::messages::TaskEvent;
use stylist_core::task_status::TaskStatus;
use stylist_core::types::TaskId;
use stylist_db::store::TaskStore;

use crate::ws::TaskChannelRegistry;

/// Cancel a `PENDING` or `PROCESSING` task and push `CANCELED`.
///
/// Returns `false` when the task is missing or already terminal; nothing
/// is pushed in that case.
pub async fn cancel_task(
    tasks: &dyn TaskStore,
    registry: &TaskChannelRegistry,
    task_id: TaskId,
) -> Result<bool, sqlx::Error> {
    let canceled = tasks
        .transition(
            task_id,
            &[TaskStatus::Pending, TaskStatus::Processing],
            TaskStatus::Canceled,
        )
        .await?;
    if canceled {
        registry.notify(task_id, &TaskEvent::canceled()).await;
    }
    Ok(canceled)
}

/// Move a task from one of `from` to `FAILED` and push `code`.
pub async fn fail_task(
    tasks: &dyn TaskStore,
    registry: &TaskChannelRegistry,
    task_id: TaskId,
    from: &[TaskStatus],
    code: ErrorCode,
) -> Result<bool, sqlx::Error> {
    let failed = tasks.transition(task_id, from, TaskStatus::Failed).await?;
    if failed {
        registry.notify(task_id, &TaskEvent::failed(code)).await;
    }
    Ok(failed)
}
