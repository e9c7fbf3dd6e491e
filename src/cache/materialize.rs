//! Atomic materialization of downloaded streams into cache entries
//!
//! A stream is written to `<entry>.tmp` under the entry's lock, verified,
//! decompressed and then renamed onto the entry path. The rename is the only
//! externally visible step, so a crash at any earlier point leaves no trace at
//! the entry path.

use crate::cache::lock::critical_section;
use crate::cache::verify::{checksum_matches, HashingReader};
use crate::decompress::{with_suffix, DecompressorRegistry};
use crate::error::{CacheError, CacheResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Sibling lock file for an entry
pub fn lock_path(entry: &Path) -> PathBuf {
    with_suffix(entry, ".lock")
}

/// Sibling staging file for an entry
pub fn temp_path(entry: &Path) -> PathBuf {
    with_suffix(entry, ".tmp")
}

/// Writes verified, decompressed entries
#[derive(Debug, Clone)]
pub struct Materializer {
    registry: Arc<DecompressorRegistry>,
}

impl Materializer {
    pub fn new(registry: Arc<DecompressorRegistry>) -> Self {
        Self { registry }
    }

    /// Decompressors consulted after a download is verified
    pub fn registry(&self) -> &DecompressorRegistry {
        &self.registry
    }

    /// Write `reader` to `dest`, verifying `expected_sha256` if given.
    ///
    /// On success `dest` holds the complete, verified and decompressed
    /// content. If `dest` already exists once the lock is held, another
    /// writer finished first and the stream is not read at all. On failure
    /// `dest` is left as it was; a temporary file may remain for inspection
    /// and is discarded by the next attempt.
    pub fn materialize<R: Read>(
        &self,
        reader: R,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> CacheResult<()> {
        debug!("Unpacking file into {}...", dest.display());
        critical_section(&lock_path(dest), || {
            self.write_locked(reader, dest, expected_sha256)
        })
    }

    fn write_locked<R: Read>(
        &self,
        reader: R,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> CacheResult<()> {
        match fs::metadata(dest) {
            Ok(_) => {
                debug!("{} was completed by another writer", dest.display());
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::io(format!("checking {}", dest.display()), e));
            }
        }

        let tmp = temp_path(dest);
        remove_stale(&tmp)?;
        remove_stale(&with_suffix(&tmp, "_uncompressed"))?;

        let file = create_exclusive(&tmp)?;
        let actual = copy_to_file(reader, file, &tmp, expected_sha256.is_some())?;

        if let (Some(expected), Some(actual)) = (expected_sha256, actual) {
            if !checksum_matches(expected, &actual) {
                error!("File sha256 checksum is invalid");
                return Err(CacheError::Integrity {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
            debug!("Checksum validation is complete");
        }

        // Decompresses into a sibling if needed, then renames onto `dest`.
        self.registry.decompress(&tmp, dest)?;
        debug!("Materialized {}", dest.display());
        Ok(())
    }
}

/// Delete a leftover from a crashed attempt; a missing file is fine
fn remove_stale(path: &Path) -> CacheResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(
                "Temporary file {} that remained after a previous attempt was deleted",
                path.display()
            );
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(
            format!("failed to clean up {}", path.display()),
            e,
        )),
    }
}

fn create_exclusive(path: &Path) -> CacheResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            CacheError::Conflict(path.to_path_buf())
        } else {
            CacheError::io(format!("creating {}", path.display()), e)
        }
    })
}

/// Stream into `file`, returning the hex SHA-256 when `hash` is set
fn copy_to_file<R: Read>(
    mut reader: R,
    file: File,
    path: &Path,
    hash: bool,
) -> CacheResult<Option<String>> {
    let context = || format!("writing {}", path.display());
    let mut writer = BufWriter::new(file);

    let digest = if hash {
        let mut hashing = HashingReader::new(reader);
        io::copy(&mut hashing, &mut writer).map_err(|e| CacheError::io(context(), e))?;
        debug!("Hashed {} bytes", hashing.bytes_read());
        Some(hashing.finalize_hex())
    } else {
        io::copy(&mut reader, &mut writer).map_err(|e| CacheError::io(context(), e))?;
        None
    };

    writer.flush().map_err(|e| CacheError::io(context(), e))?;
    let file = writer
        .into_inner()
        .map_err(|e| CacheError::io(context(), e.into_error()))?;
    file.sync_all().map_err(|e| CacheError::io(context(), e))?;
    Ok(digest)
}
