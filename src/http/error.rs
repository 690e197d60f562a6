//! Handler and response errors.

use std::io;

use axum::http::StatusCode;
use thiserror::Error;

/// Error returned by a handler or middleware.
///
/// The engine hands it to the error handler; the default one answers with
/// `status_code()` and a JSON `{"message": ...}` body.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("response write failed: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HandlerError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Status the error maps to. Anything without an explicit status is 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error from committing a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The response was already finalized; the first result stands.
    #[error("response already committed")]
    AlreadyCommitted,
}
