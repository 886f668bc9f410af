//! Build scheduler.
//!
//! A fixed pool of slots (a counting semaphore sized to `max_tasks`) gates
//! archive builds. `submit` never waits: it spawns a background unit of work
//! that first waits for a slot, then runs the blocking archive build, records
//! the terminal state on the task, and releases the slot.

mod finish;
mod guard;

pub use finish::archive_location;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::Instrument;
use tokio::task::JoinHandle;

use crate::archive::ArchiveBuilder;
use crate::task::{TaskId, TaskStatus, TaskStore};

use guard::{PendingBuilds, PendingGuard};

pub struct BuildScheduler {
    capacity: usize,
    slots: Arc<Semaphore>,
    store: Arc<TaskStore>,
    builder: Arc<ArchiveBuilder>,
    public_url: Arc<str>,
    pending: Arc<PendingBuilds>,
}

impl BuildScheduler {
    /// Create a scheduler with `capacity` build slots (at least 1).
    pub fn new(
        capacity: usize,
        store: Arc<TaskStore>,
        builder: Arc<ArchiveBuilder>,
        public_url: impl Into<String>,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
            store,
            builder,
            public_url: Arc::from(public_url.into()),
            pending: Arc::new(PendingBuilds::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held by running builds.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.slots.available_permits())
    }

    /// Free slots. May be 0 while builds run.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Builds submitted and not yet finished, running or waiting for a slot.
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// Queue a build for `id`. Returns immediately; the build starts once a slot frees up.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn submit(&self, id: TaskId, links: Vec<String>) -> JoinHandle<()> {
        let guard = PendingGuard::enter(Arc::clone(&self.pending));
        let slots = Arc::clone(&self.slots);
        let store = Arc::clone(&self.store);
        let builder = Arc::clone(&self.builder);
        let public_url = Arc::clone(&self.public_url);
        tracing::info!(task = %id, links = links.len(), "build queued");
        let span = tracing::info_span!("build", task = %id);

        let work = async move {
            let _guard = guard;
            let Ok(permit) = slots.acquire_owned().await else {
                tracing::warn!(task = %id, "scheduler closed before build started");
                finish::mark(
                    &store,
                    id,
                    TaskStatus::Failed,
                    None,
                    vec!["build cancelled: server shutting down".to_string()],
                );
                return;
            };
            tracing::debug!(task = %id, "build slot acquired");
            tracing::info!(task = %id, links = links.len(), "build started");

            let started = Instant::now();
            let span = tracing::Span::current();
            let outcome =
                tokio::task::spawn_blocking(move || span.in_scope(|| builder.build(id, &links)))
                    .await;
            finish::record_outcome(&store, id, outcome, &public_url, started.elapsed());
            drop(permit);
        };
        tokio::spawn(work.instrument(span))
    }

    /// Stop starting new builds. Builds still waiting for a slot are marked failed;
    /// running builds continue to completion.
    pub fn close(&self) {
        self.slots.close();
    }

    /// Wait until every submitted build has finished.
    pub async fn drain(&self) {
        self.pending.wait_idle().await;
    }
}
