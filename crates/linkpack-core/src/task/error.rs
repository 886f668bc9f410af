//! Validation errors surfaced synchronously to callers.

use super::TaskId;

/// Rejections from task creation, link submission, and lookups.
/// None of these leave a mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} already exists")]
    AlreadyExists(TaskId),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("server busy: {limit} tasks already processing")]
    ServerBusy { limit: usize },
    #[error("task {id} already has the maximum of {max} links")]
    QuotaExceeded { id: TaskId, max: usize },
    #[error("unsupported file type for {link}")]
    UnsupportedType { link: String },
    #[error("archive for task {0} is not ready")]
    NotReady(TaskId),
}
