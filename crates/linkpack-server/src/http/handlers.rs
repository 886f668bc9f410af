//! Request handlers. Each one is a thin translation onto `TaskService`.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkpack_core::{Task, TaskError, TaskId};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// An id that does not parse cannot name a task, so it is reported as unknown.
fn parse_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownTask(raw.to_string()))
}

/// `POST /tasks`
pub async fn create_task(
    State(service): State<AppState>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = service.create_task()?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// `POST /tasks/{id}/links` with `{"link": "..."}`
pub async fn add_link(
    State(service): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<AddLinkRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.link.trim().is_empty() {
        return Err(ApiError::BadRequest("link must not be empty".to_string()));
    }
    service.add_link(id, request.link.trim())?;
    Ok(Json(MessageResponse {
        message: "link added",
    }))
}

/// `GET /tasks/{id}/status`
pub async fn task_status(
    State(service): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(service.task(id)?))
}

/// `GET /archives/{id}`: stream the finished ZIP.
pub async fn download_archive(
    State(service): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id).map_err(|_| ApiError::ArchiveUnavailable)?;
    let path = service.archive_path(id).map_err(|e| match e {
        TaskError::NotFound(_) | TaskError::NotReady(_) => ApiError::ArchiveUnavailable,
        other => ApiError::Task(other),
    })?;
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(task = %id, path = %path.display(), "open archive: {}", e);
            return Err(ApiError::ArchiveUnavailable);
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={id}.zip"),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}
