//! Task Queue backed by the `task_messages` table.

use std::time::Duration;

use async_trait::async_trait;
use stylist_core::messages::SubmissionMessage;

use super::{Delivery, QueueError, TaskQueue};
use crate::repositories::TaskMessageRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgTaskQueue {
    pool: DbPool,
    visibility_timeout: Duration,
}

impl PgTaskQueue {
    pub fn new(pool: DbPool, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            visibility_timeout,
        }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(&self, message: &SubmissionMessage) -> Result<(), QueueError> {
        let payload = serde_json::to_value(message)?;
        let id = TaskMessageRepo::insert(&self.pool, message.task_id, &payload).await?;
        tracing::debug!(message_id = id, task_id = %message.task_id, "Message enqueued");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let Some(row) =
            TaskMessageRepo::claim_next(&self.pool, self.visibility_timeout.as_secs_f64()).await?
        else {
            return Ok(None);
        };

        match serde_json::from_value::<SubmissionMessage>(row.payload) {
            Ok(message) => Ok(Some(Delivery {
                id: row.id,
                message,
                delivery_count: row.delivery_count,
            })),
            Err(e) => {
                // Poison message: drop it so it cannot block the queue.
                tracing::error!(message_id = row.id, error = %e, "Dropping malformed queue message");
                TaskMessageRepo::delete(&self.pool, row.id).await?;
                Err(QueueError::Payload(e))
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        TaskMessageRepo::delete(&self.pool, delivery.id).await?;
        Ok(())
    }

    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError> {
        TaskMessageRepo::release(&self.pool, delivery.id).await?;
        Ok(())
    }
}
