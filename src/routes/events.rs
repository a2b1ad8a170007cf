//! Single-event endpoints

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use eventide_core::{Event, EventDraft, EventError, EventPatch};

use crate::routes::{AppError, EventList};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// GET /events - List every event in insertion order
async fn list_events(State(state): State<AppState>) -> Json<EventList> {
    let service = state.read().await;
    Json(EventList {
        events: service.list_all().to_vec(),
    })
}

/// GET /events/{id} - Fetch one event
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let service = state.read().await;
    Ok(Json(service.get(&id)?.clone()))
}

/// POST /events - Create an event, expanding it if it repeats
///
/// For a repeating template the first occurrence is returned; the rest are
/// visible through GET /events.
async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let Json(template) = payload?;

    let created = state.write().await.create_single(template)?;
    let first = created
        .into_iter()
        .next()
        .ok_or_else(|| EventError::validation("no event was created"))?;

    Ok((StatusCode::CREATED, Json(first)))
}

/// PUT /events/{id} - Patch one occurrence
async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<Event>, AppError> {
    let Json(patch) = payload?;
    let updated = state.write().await.update_single(&id, patch)?;
    Ok(Json(updated))
}

/// DELETE /events/{id} - Remove one occurrence
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.write().await.delete_single(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
