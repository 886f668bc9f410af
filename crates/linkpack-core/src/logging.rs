//! Structured logging: one global subscriber writing to the state-dir log file or stderr.
//!
//! Builds run inside a `build` span carrying the task id, so events emitted on
//! blocking threads stay attributed to their task and the span close records
//! how long the build took.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,linkpack_core=debug,linkpack=debug";

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// `~/.local/state/linkpack/linkpack.log`
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkpack")?;
    Ok(xdg_dirs.get_state_home().join("linkpack.log"))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber and report where it writes.
///
/// Unless `prefer_stderr` is set, output goes to the state-dir log file. If that
/// file cannot be opened the subscriber writes to stderr and says why. A second
/// call leaves the first subscriber in place.
pub fn init(prefer_stderr: bool) -> LogSink {
    let mut fallback_reason = None;
    let (writer, sink) = if prefer_stderr {
        (BoxMakeWriter::new(std::io::stderr), LogSink::Stderr)
    } else {
        match log_file_path().and_then(|p| open_log_file(&p).map(|f| (f, p))) {
            Ok((file, path)) => (BoxMakeWriter::new(Mutex::new(file)), LogSink::File(path)),
            Err(e) => {
                fallback_reason = Some(e);
                (BoxMakeWriter::new(std::io::stderr), LogSink::Stderr)
            }
        }
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .is_ok();

    if let Some(e) = fallback_reason {
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
    if installed {
        tracing::debug!(sink = ?sink, "logging initialized");
    }
    sink
}
