//! Live map API endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::MapLocationSnapshot;
use crate::AppState;

/// GET /api/map - Current joined location view in snapshot shape.
pub async fn get_map(State(state): State<AppState>) -> ApiResult<Vec<MapLocationSnapshot>> {
    let locations = state.map_view.capture().await?;
    success(locations)
}
