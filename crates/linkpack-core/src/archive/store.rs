//! Local blob storage for archives, addressed by task id.
//!
//! Archives are written to `{dir}/{id}.zip.part` and renamed to `{dir}/{id}.zip`
//! once complete, so a download never sees a half-written file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::task::TaskId;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `x.zip` → `x.zip.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

#[derive(Debug, Clone)]
pub struct ArchiveStore {
    dir: PathBuf,
}

impl ArchiveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final location of the archive for `id`.
    pub fn archive_path(&self, id: TaskId) -> PathBuf {
        self.dir.join(format!("{id}.zip"))
    }

    /// Create (or truncate) the temp archive file for `id`, creating the directory if needed.
    pub fn create_temp(&self, id: TaskId) -> io::Result<(File, PathBuf)> {
        std::fs::create_dir_all(&self.dir)?;
        let path = temp_path(&self.archive_path(id));
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok((file, path))
    }

    /// Atomically rename the temp archive to its final path.
    pub fn finalize(&self, id: TaskId) -> io::Result<PathBuf> {
        let final_path = self.archive_path(id);
        std::fs::rename(temp_path(&final_path), &final_path)?;
        Ok(final_path)
    }

    /// Best-effort removal of a leftover temp archive.
    pub fn discard_temp(&self, id: TaskId) {
        let path = temp_path(&self.archive_path(id));
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), "remove temp archive: {}", e);
            }
        }
    }
}
