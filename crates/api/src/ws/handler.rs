use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use stylist_core::error_code::ErrorCode;
use stylist_core::messages::CANCEL_COMMAND;
use stylist_core::types::TaskId;
use stylist_db::store::TaskStore;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppResult;
use crate::state::AppState;
use crate::ws::registry::TaskChannelRegistry;

/// Query string of the channel handshake.
#[derive(Debug, Deserialize)]
pub struct TaskChannelParams {
    pub task_id: Option<String>,
}

/// GET /api/v1/ws/tasks?task_id=<uuid>
///
/// Upgrades to a WebSocket bound to one task. A missing or malformed
/// `task_id` is rejected with 400 before the upgrade.
pub async fn task_ws_handler(
    State(state): State<AppState>,
    Query(params): Query<TaskChannelParams>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let task_id = params
        .task_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(ErrorCode::InvalidRequest)?;

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, task_id, state.registry, state.tasks)
    }))
}

/// Manage a single task channel after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection, replacing any previous one for the task.
///   2. Spawns a sender task that forwards messages from the registry channel.
///   3. Handles inbound `CANCEL` commands on the current task.
///   4. Removes the entry on disconnect if it is still ours.
async fn handle_socket(
    socket: WebSocket,
    task_id: TaskId,
    registry: Arc<TaskChannelRegistry>,
    tasks: Arc<dyn TaskStore>,
) {
    let conn_id = Uuid::new_v4();
    tracing::info!(task_id = %task_id, conn_id = %conn_id, "Task channel connected");

    let mut rx = registry.register(task_id, conn_id).await;

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) if text.as_str() == CANCEL_COMMAND => {
                tracing::debug!(task_id = %task_id, "Cancel requested over task channel");
                match lifecycle::cancel_task(tasks.as_ref(), &registry, task_id).await {
                    Ok(true) => tracing::info!(task_id = %task_id, "Task canceled by client"),
                    Ok(false) => {
                        tracing::debug!(task_id = %task_id, "Late cancel ignored");
                    }
                    Err(e) => {
                        tracing::error!(task_id = %task_id, error = %e, "Cancel failed");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    registry.remove(task_id, conn_id).await;
    send_task.abort();
    tracing::info!(task_id = %task_id, conn_id = %conn_id, "Task channel disconnected");
}
