//! Cross-process advisory locking on sibling lock files
//!
//! Writers of a cache entry serialize on `<entry>.lock` with an exclusive
//! advisory lock (`flock(2)` on Unix).
//! Acquisition blocks without a timeout. The lock file is deleted when the
//! holder leaves the critical section, so a waiter that wakes up holding a
//! lock on an unlinked file retries against the current one.

use crate::error::{CacheError, CacheResult};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive lock held on a lock file
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until an exclusive lock on `path` is held, creating the file if needed
    pub fn acquire(path: &Path) -> CacheResult<Self> {
        loop {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .mode(0o600)
                .open(path)
                .map_err(|e| CacheError::io(format!("opening lock file {}", path.display()), e))?;

            lock_exclusive(&file)
                .map_err(|e| CacheError::io(format!("locking {}", path.display()), e))?;

            if still_linked(&file, path)? {
                debug!("Acquired lock {}", path.display());
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            debug!("Lock file {} was replaced while waiting, retrying", path.display());
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the lock file (best effort) and release the lock.
    ///
    /// The file is unlinked before unlocking so that waiters never end up
    /// holding a lock on a file a newcomer cannot see.
    pub fn release(self) -> CacheResult<()> {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove lock file {}: {}", self.path.display(), e);
            }
        }

        FileExt::unlock(&self.file)
            .map_err(|e| CacheError::io(format!("unlocking {}", self.path.display()), e))?;
        debug!("Released lock {}", self.path.display());
        Ok(())
    }
}

/// Run `f` while holding the exclusive lock at `lock_path`.
///
/// The lock is released on every exit path. An error from `f` takes
/// precedence over an error from releasing the lock.
pub fn critical_section<T>(
    lock_path: &Path,
    f: impl FnOnce() -> CacheResult<T>,
) -> CacheResult<T> {
    let lock = FileLock::acquire(lock_path)?;
    let result = f();
    let released = lock.release();
    let value = result?;
    released?;
    Ok(value)
}

fn lock_exclusive(file: &File) -> io::Result<()> {
    loop {
        match FileExt::lock_exclusive(file) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Whether the open lock file is still the one linked at `path`
fn still_linked(file: &File, path: &Path) -> CacheResult<bool> {
    let held = file
        .metadata()
        .map_err(|e| CacheError::io(format!("inspecting lock file {}", path.display()), e))?;
    match fs::metadata(path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(
            format!("inspecting lock file {}", path.display()),
            e,
        )),
    }
}
