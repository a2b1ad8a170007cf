//! Error types for eventide.

use thiserror::Error;

/// Errors that can occur in event store and series operations.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EventError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EventError::Validation(msg.into())
    }
}

/// Result type alias for eventide operations.
pub type EventResult<T> = Result<T, EventError>;
