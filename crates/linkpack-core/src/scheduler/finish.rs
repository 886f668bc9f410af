//! Post-build phase: record the terminal state on the task.

use std::time::Duration;

use tokio::task::JoinError;

use crate::archive::{BuildError, BuildReport};
use crate::task::{TaskId, TaskStatus, TaskStore};

/// Where a finished archive can be downloaded.
pub fn archive_location(public_url: &str, id: TaskId) -> String {
    format!("{}/archives/{}", public_url.trim_end_matches('/'), id)
}

/// Moves the task to `Completed` (with location and per-link errors) or `Failed`
/// (with the fatal reason). A panicked build counts as fatal.
pub(super) fn record_outcome(
    store: &TaskStore,
    id: TaskId,
    outcome: Result<Result<BuildReport, BuildError>, JoinError>,
    public_url: &str,
    elapsed: Duration,
) {
    let (status, location, errors) = match outcome {
        Ok(Ok(report)) => {
            tracing::info!(
                task = %id,
                entries = report.entries.len(),
                failed_links = report.failures.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "build completed: {}",
                report.archive_path.display()
            );
            let errors = report.failures.iter().map(ToString::to_string).collect();
            (
                TaskStatus::Completed,
                Some(archive_location(public_url, id)),
                errors,
            )
        }
        Ok(Err(e)) => {
            tracing::error!(task = %id, "build failed: {}", e);
            (TaskStatus::Failed, None, vec![e.to_string()])
        }
        Err(e) => {
            tracing::error!(task = %id, "build task join: {}", e);
            (
                TaskStatus::Failed,
                None,
                vec![format!("build aborted: {}", e)],
            )
        }
    };
    mark(store, id, status, location, errors);
}

/// Writes a terminal state onto the task.
pub(super) fn mark(
    store: &TaskStore,
    id: TaskId,
    status: TaskStatus,
    location: Option<String>,
    errors: Vec<String>,
) {
    let res = store.modify(id, |task| {
        task.status = status;
        task.archive_location = location;
        task.errors = errors;
        Ok(())
    });
    if let Err(e) = res {
        tracing::warn!(task = %id, "record build outcome: {}", e);
    }
}
