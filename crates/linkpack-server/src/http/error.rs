//! Mapping from domain errors to HTTP responses. Bodies are `{"error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkpack_core::TaskError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("task {0} not found")]
    UnknownTask(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("archive not ready or not found")]
    ArchiveUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Task(TaskError::NotFound(_))
            | ApiError::Task(TaskError::NotReady(_))
            | ApiError::UnknownTask(_)
            | ApiError::ArchiveUnavailable => StatusCode::NOT_FOUND,
            ApiError::Task(TaskError::ServerBusy { .. }) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Task(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), "request rejected: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
