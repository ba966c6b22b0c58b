use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use stylist_core::messages::TaskEvent;
use stylist_core::types::{TaskId, Timestamp};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A live connection bound to one task.
pub struct TaskChannel {
    /// Distinguishes a replaced connection from its successor.
    pub conn_id: Uuid,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Maps each task id to at most one live connection.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared by the
/// upgrade handler, the worker pool and the watchdog sweeps. Registration
/// and push both take the write lock, so a push never interleaves with a
/// replacement of the same entry.
pub struct TaskChannelRegistry {
    channels: RwLock<HashMap<TaskId, TaskChannel>>,
}

impl TaskChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `conn_id` to `task_id`, replacing any existing connection.
    ///
    /// The replaced connection is sent a Close frame. Returns the receiver
    /// half of the message channel so the caller can forward messages to
    /// the WebSocket sink.
    pub async fn register(
        &self,
        task_id: TaskId,
        conn_id: Uuid,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = TaskChannel {
            conn_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        let previous = self.channels.write().await.insert(task_id, channel);
        if let Some(old) = previous {
            let age_secs = (chrono::Utc::now() - old.connected_at).num_seconds();
            tracing::info!(
                task_id = %task_id,
                old_conn_id = %old.conn_id,
                old_age_secs = age_secs,
                "Replacing task channel",
            );
            let _ = old.sender.send(Message::Close(None));
        }
        rx
    }

    /// Remove the entry for `task_id` if it still belongs to `conn_id`.
    pub async fn remove(&self, task_id: TaskId, conn_id: Uuid) -> bool {
        let mut channels = self.channels.write().await;
        match channels.get(&task_id) {
            Some(channel) if channel.conn_id == conn_id => {
                channels.remove(&task_id);
                true
            }
            _ => false,
        }
    }

    /// Deliver `event` to the client watching `task_id`.
    ///
    /// With `close_after`, the entry is removed and a Close frame follows
    /// the event. A missing entry is a silent no-op; a closed one is
    /// removed. Returns whether the event was handed to the connection.
    pub async fn push(&self, task_id: TaskId, event: &TaskEvent, close_after: bool) -> bool {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Failed to serialize task event");
                return false;
            }
        };

        let mut channels = self.channels.write().await;
        let Some(channel) = channels.get(&task_id) else {
            tracing::debug!(task_id = %task_id, status = %event.status, "No channel for task event");
            return false;
        };

        if channel.sender.send(Message::Text(payload.into())).is_err() {
            tracing::debug!(task_id = %task_id, "Task channel already closed");
            channels.remove(&task_id);
            return false;
        }

        if close_after {
            if let Some(channel) = channels.remove(&task_id) {
                let _ = channel.sender.send(Message::Close(None));
            }
        }
        tracing::debug!(task_id = %task_id, status = %event.status, close_after, "Task event pushed");
        true
    }

    /// Push `event`, closing the channel when the event is terminal.
    pub async fn notify(&self, task_id: TaskId, event: &TaskEvent) -> bool {
        self.push(task_id, event, event.is_terminal()).await
    }

    pub async fn is_registered(&self, task_id: TaskId) -> bool {
        self.channels.read().await.contains_key(&task_id)
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut channels = self.channels.write().await;
        let count = channels.len();
        for channel in channels.values() {
            let _ = channel.sender.send(Message::Close(None));
        }
        channels.clear();
        tracing::info!(count, "Closed all task channels");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let channels = self.channels.read().await;
        for channel in channels.values() {
            let _ = channel.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for TaskChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
