//! RAII accounting of submitted builds, so shutdown can wait for them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Number of builds submitted but not yet finished (waiting for a slot or running).
#[derive(Debug, Default)]
pub(super) struct PendingBuilds {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingBuilds {
    pub(super) fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Resolves once no build is pending.
    pub(super) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Counts one pending build; decrements when dropped, whatever the build's outcome.
pub(super) struct PendingGuard {
    pending: Arc<PendingBuilds>,
}

impl PendingGuard {
    pub(super) fn enter(pending: Arc<PendingBuilds>) -> Self {
        pending.count.fetch_add(1, Ordering::AcqRel);
        Self { pending }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.pending.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.pending.idle.notify_waiters();
        }
    }
}
