use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every handler failure is translated into one of these before it leaves the
/// API layer. The client only ever sees the coarse message below; root causes
/// stay in the logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    /// Unknown email and wrong password collapse into this one variant so the
    /// response cannot reveal which it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    DuplicateEmail,

    /// Missing, malformed, and expired tokens all map here.
    #[error("Authorization denied")]
    Unauthorized,

    /// Covers both "no such note" and "someone else's note".
    #[error("Note not found")]
    NotFound,

    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(cause) => {
                error!("internal error: {:#}", cause);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
