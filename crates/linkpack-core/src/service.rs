//! Task service: admission, link accumulation, status, and archive lookup.
//!
//! This is the surface the request boundary drives. Validation errors come back
//! synchronously; builds run in the background and report only through the store.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::{ArchiveBuilder, ArchiveStore};
use crate::config::LinkpackConfig;
use crate::fetch::{CurlFetcher, Fetcher};
use crate::links::AllowedExtensions;
use crate::scheduler::BuildScheduler;
use crate::task::{Task, TaskError, TaskId, TaskStatus, TaskStore};

/// Result of a successful `add_link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAdded {
    /// Links on the task after this one was appended.
    pub link_count: usize,
    /// True when this link filled the quota and the build was queued.
    pub build_queued: bool,
}

pub struct TaskService {
    store: Arc<TaskStore>,
    scheduler: BuildScheduler,
    archives: ArchiveStore,
    allowed: AllowedExtensions,
    max_tasks: usize,
    max_links_per_task: usize,
}

impl TaskService {
    /// Service using the curl fetcher configured from `cfg.fetch`.
    pub fn from_config(cfg: &LinkpackConfig) -> Self {
        Self::with_fetcher(cfg, Arc::new(CurlFetcher::new(cfg.fetch.clone())))
    }

    pub fn with_fetcher(cfg: &LinkpackConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let cfg = cfg.clone().normalized();
        let store = Arc::new(TaskStore::new());
        let archives = ArchiveStore::new(cfg.archive_dir.clone());
        let builder = Arc::new(ArchiveBuilder::new(archives.clone(), fetcher));
        let scheduler = BuildScheduler::new(
            cfg.max_tasks,
            Arc::clone(&store),
            builder,
            cfg.public_base_url(),
        );
        Self {
            store,
            scheduler,
            archives,
            allowed: AllowedExtensions::new(&cfg.allowed_extensions),
            max_tasks: cfg.max_tasks,
            max_links_per_task: cfg.max_links_per_task,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn scheduler(&self) -> &BuildScheduler {
        &self.scheduler
    }

    /// Create a task unless `max_tasks` tasks are already processing.
    pub fn create_task(&self) -> Result<TaskId, TaskError> {
        let id = TaskId::new_v4();
        self.store.create_admitted(id, self.max_tasks)?;
        tracing::info!(task = %id, "task created");
        Ok(id)
    }

    /// Validate and append `link`. Filling the quota moves the task to
    /// `Processing` and queues its build; the call does not wait for it.
    ///
    /// Checks, in order: task exists, quota not reached, extension allowed.
    ///
    /// # Panics
    ///
    /// The call that fills the quota spawns the build onto the current tokio
    /// runtime and panics if there is none. Adds below the quota never touch
    /// the runtime.
    pub fn add_link(&self, id: TaskId, link: &str) -> Result<LinkAdded, TaskError> {
        let max = self.max_links_per_task;
        let (link_count, to_build) = self.store.modify(id, |task| {
            if task.status != TaskStatus::Created || task.links.len() >= max {
                return Err(TaskError::QuotaExceeded { id, max });
            }
            if !self.allowed.permits(link) {
                return Err(TaskError::UnsupportedType {
                    link: link.to_string(),
                });
            }
            task.links.push(link.to_string());
            if task.links.len() == max {
                task.status = TaskStatus::Processing;
                Ok((task.links.len(), Some(task.links.clone())))
            } else {
                Ok((task.links.len(), None))
            }
        })?;
        tracing::debug!(task = %id, link, link_count, "link added");

        let build_queued = match to_build {
            Some(links) => {
                self.scheduler.submit(id, links);
                true
            }
            None => false,
        };
        Ok(LinkAdded {
            link_count,
            build_queued,
        })
    }

    pub fn task(&self, id: TaskId) -> Result<Task, TaskError> {
        self.store.get(id)
    }

    /// Local path of a finished archive. Anything but `Completed` is `NotReady`.
    pub fn archive_path(&self, id: TaskId) -> Result<PathBuf, TaskError> {
        let task = self.store.get(id)?;
        if task.status != TaskStatus::Completed {
            return Err(TaskError::NotReady(id));
        }
        Ok(self.archives.archive_path(id))
    }

    /// Stop starting builds and wait for the running ones.
    pub async fn shutdown(&self) {
        self.scheduler.close();
        self.scheduler.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use std::io::Write;
    use std::time::Duration;

    struct OkFetcher;

    impl Fetcher for OkFetcher {
        fn fetch(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            sink.write_all(b"%PDF").map_err(FetchError::Sink)?;
            Ok(4)
        }
    }

    fn service(dir: &std::path::Path, max_tasks: usize, max_links: usize) -> TaskService {
        let cfg = LinkpackConfig {
            max_tasks,
            max_links_per_task: max_links,
            allowed_extensions: vec![".pdf".to_string()],
            archive_dir: dir.to_path_buf(),
            ..LinkpackConfig::default()
        };
        TaskService::with_fetcher(&cfg, Arc::new(OkFetcher))
    }

    async fn wait_terminal(svc: &TaskService, id: TaskId) -> Task {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let task = svc.task(id).unwrap();
                if task.status.is_terminal() {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("task reaches a terminal state")
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 2);
        let id = TaskId::new_v4();
        assert_eq!(
            svc.add_link(id, "http://x/a.pdf"),
            Err(TaskError::NotFound(id))
        );
        assert_eq!(svc.task(id), Err(TaskError::NotFound(id)));
        assert_eq!(svc.archive_path(id), Err(TaskError::NotFound(id)));
    }

    #[tokio::test]
    async fn unsupported_extension_leaves_task_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 2);
        let id = svc.create_task().unwrap();
        assert_eq!(
            svc.add_link(id, "http://x/doc.txt"),
            Err(TaskError::UnsupportedType {
                link: "http://x/doc.txt".to_string()
            })
        );
        let task = svc.task(id).unwrap();
        assert!(task.links.is_empty());
        assert_eq!(task.status, TaskStatus::Created);
    }

    #[tokio::test]
    async fn quota_is_checked_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 1);
        let id = svc.create_task().unwrap();
        svc.add_link(id, "http://x/a.pdf").unwrap();
        assert_eq!(
            svc.add_link(id, "http://x/b.txt"),
            Err(TaskError::QuotaExceeded { id, max: 1 })
        );
        svc.shutdown().await;
    }

    #[tokio::test]
    async fn quota_triggers_processing_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 2);
        let id = svc.create_task().unwrap();

        let first = svc.add_link(id, "http://x/a.pdf").unwrap();
        assert_eq!(
            first,
            LinkAdded {
                link_count: 1,
                build_queued: false
            }
        );
        assert_eq!(svc.task(id).unwrap().status, TaskStatus::Created);

        let second = svc.add_link(id, "http://x/b.PDF").unwrap();
        assert!(second.build_queued);
        assert_eq!(second.link_count, 2);

        assert_eq!(
            svc.add_link(id, "http://x/c.pdf"),
            Err(TaskError::QuotaExceeded { id, max: 2 })
        );

        let task = wait_terminal(&svc, id).await;
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.links, vec!["http://x/a.pdf", "http://x/b.PDF"]);
        assert!(task.archive_location.is_some());
        assert_eq!(svc.archive_path(id).unwrap(), dir.path().join(format!("{id}.zip")));

        assert_eq!(
            svc.add_link(id, "http://x/d.pdf"),
            Err(TaskError::QuotaExceeded { id, max: 2 })
        );
        assert_eq!(svc.task(id).unwrap().links.len(), 2);
    }

    #[tokio::test]
    async fn finalize_failure_marks_task_failed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 1);
        let id = svc.create_task().unwrap();
        let occupied = dir.path().join(format!("{id}.zip"));
        std::fs::create_dir_all(occupied.join("inner")).unwrap();

        svc.add_link(id, "http://x/a.pdf").unwrap();
        let task = wait_terminal(&svc, id).await;
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.archive_location.is_none());
        assert_eq!(task.errors.len(), 1);
        assert!(task.errors[0].starts_with("finalize archive"), "{}", task.errors[0]);
        assert!(!crate::archive::temp_path(&occupied).exists());
        assert_eq!(svc.archive_path(id), Err(TaskError::NotReady(id)));
    }

    #[test]
    fn adds_below_quota_need_no_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 3);
        let id = svc.create_task().unwrap();
        for (n, link) in ["http://x/a.pdf", "http://x/b.pdf"].iter().enumerate() {
            let added = svc.add_link(id, link).unwrap();
            assert_eq!(added.link_count, n + 1);
            assert!(!added.build_queued);
        }
        assert_eq!(svc.task(id).unwrap().status, TaskStatus::Created);
    }

    #[test]
    #[should_panic]
    fn filling_quota_outside_runtime_panics() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 1);
        let id = svc.create_task().unwrap();
        let _ = svc.add_link(id, "http://x/a.pdf");
    }

    #[tokio::test]
    async fn archive_not_ready_until_completed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 3, 2);
        let id = svc.create_task().unwrap();
        assert_eq!(svc.archive_path(id), Err(TaskError::NotReady(id)));
    }

    #[tokio::test]
    async fn admission_rejects_when_processing_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 1, 1);
        let id = svc.create_task().unwrap();

        let mut task = svc.task(id).unwrap();
        task.status = TaskStatus::Processing;
        svc.store().update(task);

        assert_eq!(svc.create_task(), Err(TaskError::ServerBusy { limit: 1 }));
        assert_eq!(svc.store().len(), 1);

        let mut task = svc.task(id).unwrap();
        task.status = TaskStatus::Completed;
        svc.store().update(task);
        assert!(svc.create_task().is_ok());
    }
}
