//! HTTP boundary: routes, JSON shaping, and status-code mapping over `TaskService`.

mod error;
mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use linkpack_core::TaskService;

/// Shared state handed to every handler.
pub type AppState = Arc<TaskService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}/links", post(handlers::add_link))
        .route("/tasks/{id}/status", get(handlers::task_status))
        .route("/archives/{id}", get(handlers::download_archive))
        .with_state(service)
}
