//! Route definitions for the `/tasks` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// POST   /                  -> submit
/// GET    /{id}              -> get_status
/// POST   /{id}/cancel       -> cancel
/// ```
///
/// The submit route lifts axum's default body limit; the handler enforces
/// `MAX_UPLOAD_BYTES` while streaming the image field.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tasks::submit).layer(DefaultBodyLimit::disable()))
        .route("/{id}", get(tasks::get_status))
        .route("/{id}/cancel", post(tasks::cancel))
}
