pub mod health;
pub mod styles;
pub mod tasks;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws/tasks?task_id=<uuid>          task notification channel (WebSocket)
///
/// /tasks                            submit (POST, multipart)
/// /tasks/{id}                       status (GET)
/// /tasks/{id}/cancel                cancel (POST)
///
/// /styles                           list (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws/tasks", get(ws::task_ws_handler))
        .nest("/tasks", tasks::router())
        .nest("/styles", styles::router())
}
