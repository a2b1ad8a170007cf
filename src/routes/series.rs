//! Series-wide endpoints, addressed by `repeat.id`

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::put,
};
use eventide_core::EventPatch;
use serde::Serialize;

use crate::routes::{AppError, EventList};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/series/{repeat_id}", put(update_series).delete(delete_series))
}

#[derive(Serialize)]
pub struct DeleteSeriesResponse {
    pub deleted: usize,
}

/// PUT /series/{repeat_id} - Patch every member; returns the updated members
async fn update_series(
    State(state): State<AppState>,
    Path(repeat_id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<EventList>, AppError> {
    let Json(patch) = payload?;
    let events = state.write().await.update_series(&repeat_id, patch)?;
    Ok(Json(EventList { events }))
}

/// DELETE /series/{repeat_id} - Remove every member; unknown series delete nothing
async fn delete_series(
    State(state): State<AppState>,
    Path(repeat_id): Path<String>,
) -> Result<Json<DeleteSeriesResponse>, AppError> {
    let deleted = state.write().await.delete_series(&repeat_id)?;
    Ok(Json(DeleteSeriesResponse { deleted }))
}
