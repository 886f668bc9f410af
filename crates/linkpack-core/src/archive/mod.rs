//! Archive builder: fetch every link of a task and bundle the successes into one ZIP.
//!
//! Failures come in two tiers. A link that cannot be fetched or written is a
//! `LinkFailure`: it is recorded in the report and the next link is tried.
//! A container that cannot be created or finished is a `BuildError` and ends
//! the build.

mod names;
mod store;

pub use names::{entry_name_for, EntryNames, DEFAULT_ENTRY_NAME};
pub use store::{temp_path, ArchiveStore, TEMP_SUFFIX};

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::fetch::{FetchError, Fetcher};
use crate::task::TaskId;

/// Recoverable failure of one link. Rendered into the task's error list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkFailure {
    #[error("fetch {link}: {reason}")]
    Fetch { link: String, reason: String },
    #[error("fetch {link}: HTTP {code}")]
    Status { link: String, code: u32 },
    #[error("archive {link}: {reason}")]
    Write { link: String, reason: String },
}

/// Fatal, container-level failure. The task becomes `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("create archive {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("finish archive {}: {source}", .path.display())]
    Finish {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("finalize archive {}: {source}", .path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of a build whose container was written successfully.
#[derive(Debug)]
pub struct BuildReport {
    pub archive_path: PathBuf,
    /// Names of the entries written, in link order.
    pub entries: Vec<String>,
    pub failures: Vec<LinkFailure>,
}

/// Builds one archive per task. Blocking: run it on a blocking thread.
pub struct ArchiveBuilder {
    store: ArchiveStore,
    fetcher: Arc<dyn Fetcher>,
}

impl ArchiveBuilder {
    pub fn new(store: ArchiveStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Fetch `links` in order into a fresh archive for `id`.
    pub fn build(&self, id: TaskId, links: &[String]) -> Result<BuildReport, BuildError> {
        let (file, temp) = self.store.create_temp(id).map_err(|source| BuildError::Create {
            path: temp_path(&self.store.archive_path(id)),
            source,
        })?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(file);
        let mut names = EntryNames::default();
        let mut entries = Vec::with_capacity(links.len());
        let mut failures = Vec::new();

        for link in links {
            match self.archive_link(&mut zip, &mut names, link, options) {
                Ok(name) => {
                    tracing::debug!(task = %id, link = %link, entry = %name, "archived");
                    entries.push(name);
                }
                Err(failure) => {
                    tracing::warn!(task = %id, "{}", failure);
                    failures.push(failure);
                }
            }
        }

        let file = match zip.finish() {
            Ok(file) => file,
            Err(source) => {
                self.store.discard_temp(id);
                return Err(BuildError::Finish { path: temp, source });
            }
        };
        if let Err(source) = file.sync_all() {
            self.store.discard_temp(id);
            return Err(BuildError::Finalize { path: temp, source });
        }
        drop(file);

        let archive_path = self.store.finalize(id).map_err(|source| {
            self.store.discard_temp(id);
            BuildError::Finalize {
                path: temp.clone(),
                source,
            }
        })?;

        Ok(BuildReport {
            archive_path,
            entries,
            failures,
        })
    }

    /// Fetch one link into a spool file, then copy it into a new entry.
    /// The archive only ever receives complete, successful bodies.
    fn archive_link(
        &self,
        zip: &mut ZipWriter<File>,
        names: &mut EntryNames,
        link: &str,
        options: SimpleFileOptions,
    ) -> Result<String, LinkFailure> {
        let write_failure = |e: &dyn std::fmt::Display| LinkFailure::Write {
            link: link.to_string(),
            reason: e.to_string(),
        };

        let mut spool = tempfile::tempfile_in(self.store.dir()).map_err(|e| write_failure(&e))?;
        match self.fetcher.fetch(link, &mut spool) {
            Ok(_) => {}
            Err(FetchError::Status(code)) => {
                return Err(LinkFailure::Status {
                    link: link.to_string(),
                    code,
                })
            }
            Err(FetchError::Sink(e)) => return Err(write_failure(&e)),
            Err(e @ FetchError::Transport(_)) => {
                return Err(LinkFailure::Fetch {
                    link: link.to_string(),
                    reason: e.to_string(),
                })
            }
        }
        spool.seek(SeekFrom::Start(0)).map_err(|e| write_failure(&e))?;

        let name = names.unique(&entry_name_for(link));
        zip.start_file(name.as_str(), options)
            .map_err(|e| write_failure(&e))?;
        if let Err(e) = io::copy(&mut spool, zip) {
            let _ = zip.abort_file();
            return Err(write_failure(&e));
        }
        names.reserve(name.clone());
        Ok(name)
    }
}
