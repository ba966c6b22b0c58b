//! Per-task notification channels over WebSocket.
//!
//! Provides the task-keyed connection registry, heartbeat monitoring, and
//! the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod registry;

pub use handler::{task_ws_handler, TaskChannelParams};
pub use heartbeat::start_heartbeat;
pub use registry::TaskChannelRegistry;
