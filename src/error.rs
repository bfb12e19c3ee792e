use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{dto::node::ErrorResponse, state::UnknownNode};

/// Message nodes expect when they use an identifier outside the roster.
pub const INVALID_NODE_MESSAGE: &str = "Invalid Pico ID";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Node identifier is not part of the configured roster.
    #[error("unknown node `{0}`")]
    UnknownNode(String),
}

impl From<UnknownNode> for ServiceError {
    fn from(err: UnknownNode) -> Self {
        ServiceError::UnknownNode(err.0)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input; the message is sent back verbatim.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownNode(_) => AppError::BadRequest(INVALID_NODE_MESSAGE.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        let payload = Json(ErrorResponse {
            success: false,
            error: message,
        });

        (status, payload).into_response()
    }
}
