//! Route definitions for the `/styles` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::styles;
use crate::state::AppState;

/// Routes mounted at `/styles`.
///
/// ```text
/// GET    /                  -> list
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(styles::list))
}
