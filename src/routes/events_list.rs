//! Batch endpoints

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use eventide_core::{EventDraft, EventUpdate};
use serde::Deserialize;

use crate::routes::{AppError, EventList};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/events-list",
        post(create_events).put(update_events).delete(delete_events),
    )
}

/// Request body for batch creation
#[derive(Deserialize)]
pub struct CreateEventsRequest {
    pub events: Vec<EventDraft>,
}

/// Request body for batch updates: a bare array or `{ "events": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
pub enum UpdateEventsRequest {
    Bare(Vec<EventUpdate>),
    Wrapped { events: Vec<EventUpdate> },
}

impl UpdateEventsRequest {
    fn into_updates(self) -> Vec<EventUpdate> {
        match self {
            UpdateEventsRequest::Bare(updates) => updates,
            UpdateEventsRequest::Wrapped { events } => events,
        }
    }
}

/// Request body for batch deletion
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventsRequest {
    pub event_ids: Vec<String>,
}

/// POST /events-list - Create several templates; returns the full collection
async fn create_events(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventList>), AppError> {
    let Json(req) = payload?;

    let mut service = state.write().await;
    let events = service.create_batch(req.events)?.to_vec();

    Ok((StatusCode::CREATED, Json(EventList { events })))
}

/// PUT /events-list - Patch several events; all ids must exist or nothing changes
async fn update_events(
    State(state): State<AppState>,
    payload: Result<Json<UpdateEventsRequest>, JsonRejection>,
) -> Result<Json<EventList>, AppError> {
    let Json(req) = payload?;

    let mut service = state.write().await;
    service.update_batch(req.into_updates())?;

    Ok(Json(EventList {
        events: service.list_all().to_vec(),
    }))
}

/// DELETE /events-list - Remove several events; all ids must exist or nothing changes
async fn delete_events(
    State(state): State<AppState>,
    payload: Result<Json<DeleteEventsRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = payload?;
    state.write().await.delete_batch(&req.event_ids)?;
    Ok(StatusCode::NO_CONTENT)
}
