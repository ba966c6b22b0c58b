//! At-least-once Task Queue.
//!
//! A received message stays invisible to other consumers until it is
//! acknowledged, released, or its visibility timeout elapses, after which it
//! is delivered again with a higher `delivery_count`. Consumers must
//! therefore treat every delivery as possibly repeated.

use async_trait::async_trait;
use stylist_core::messages::SubmissionMessage;

pub mod memory;
pub mod postgres;

pub use memory::MemoryTaskQueue;
pub use postgres::PgTaskQueue;

/// A claimed message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Queue-assigned message id, used for `ack`/`release`.
    pub id: i64,
    pub message: SubmissionMessage,
    /// 1 on first delivery.
    pub delivery_count: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed queue payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Queue is closed")]
    Closed,
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, message: &SubmissionMessage) -> Result<(), QueueError>;

    /// Claim the next visible message without blocking.
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    /// Remove a delivered message permanently.
    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Make a delivered message visible again right away.
    async fn release(&self, delivery: &Delivery) -> Result<(), QueueError>;
}
