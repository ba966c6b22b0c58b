//! Handlers for the `/styles` resource.

use axum::extract::State;
use axum::Json;
use stylist_db::models::style::Style;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/styles
///
/// List all known styles with their active flag.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Style>>>> {
    let styles = state.styles.list().await?;
    Ok(Json(DataResponse { data: styles }))
}
