pub mod events;
pub mod events_list;
pub mod series;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eventide_core::{Event, EventError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(events::router())
        .merge(events_list::router())
        .merge(series::router())
}

/// Collection envelope used by list and batch endpoints
#[derive(Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert errors to HTTP responses
///
/// `Validation` and malformed JSON -> 400, `NotFound` -> 404, other body
/// rejections keep their own status (415, 413), anything else -> 500.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<EventError>() {
            return match err {
                EventError::Validation(_) => StatusCode::BAD_REQUEST,
                EventError::NotFound(_) => StatusCode::NOT_FOUND,
                EventError::Io(_) | EventError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
        }
        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return match rejection {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    StatusCode::BAD_REQUEST
                }
                other => other.status(),
            };
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
