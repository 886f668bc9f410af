//! Process runtime, built by hand so shutdown does not wait on stuck builds.
//!
//! Builds run on tokio's blocking pool. Dropping a runtime waits for every
//! blocking task, so a slow fetch would otherwise hold the process open for
//! the whole transfer timeout.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

/// How long blocking builds may keep the process alive once the server has stopped.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub fn build() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("linkpack-worker")
        .build()
        .context("build tokio runtime")
}

/// Tear down `rt`, abandoning blocking work still running after `grace`.
pub fn shutdown(rt: Runtime, grace: Duration) {
    let started = Instant::now();
    rt.shutdown_timeout(grace);
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "runtime stopped"
    );
}
