//! Content-type driven decompression of cached files
//!
//! A [`DecompressorRegistry`] maps sniffed media types to decompression
//! routines. It is built once at startup and handed to the cache components
//! that need it; nothing here is global.
//!
//! Decompression is idempotent: once a file has been decompressed it no longer
//! sniffs as a registered type, so running it again is a no-op.

pub mod gzip;
pub mod sniff;

pub use sniff::{detect_content_type, sniff, GZIP, OCTET_STREAM, SNIFF_LEN, TEXT_PLAIN};

use crate::error::{CacheError, CacheResult};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Decompress the file at the first path into a new file at the second
pub type Decompressor = fn(&Path, &Path) -> io::Result<()>;

/// Append `suffix` to the file name of `path`
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Mapping from sniffed media type to decompression routine
#[derive(Clone, Default)]
pub struct DecompressorRegistry {
    entries: BTreeMap<String, Decompressor>,
}

impl fmt::Debug for DecompressorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl DecompressorRegistry {
    /// Create an empty registry (nothing is ever decompressed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in formats (gzip)
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(GZIP, gzip::decompress);
        registry
    }

    /// Register a decompressor for a media type, replacing any previous one
    pub fn register(
        &mut self,
        content_type: impl Into<String>,
        decompressor: Decompressor,
    ) -> &mut Self {
        self.entries.insert(content_type.into(), decompressor);
        self
    }

    /// Look up the decompressor for a media type
    pub fn lookup(&self, content_type: &str) -> Option<Decompressor> {
        self.entries.get(content_type).copied()
    }

    /// Registered media types
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether the file at `path` sniffs as a registered compressed format
    pub fn is_compressed(&self, path: &Path) -> CacheResult<bool> {
        let content_type = detect_content_type(path)?;
        Ok(self.lookup(content_type).is_some())
    }

    /// Decompress `path` in place. See [`Self::decompress`].
    pub fn decompress_in_place(&self, path: &Path) -> CacheResult<bool> {
        self.decompress(path, path)
    }

    /// Decompress `src` into `dest` if its content type is registered.
    ///
    /// When nothing is registered for the sniffed type the file is moved to
    /// `dest` untouched (a no-op when both paths are equal). Returns whether a
    /// decompressor ran.
    ///
    /// The compressed input is only deleted after the decompressed copy has
    /// been fully written, and the copy only takes `dest`'s name after that.
    /// If the decompressor fails, the input is left at `src`.
    pub fn decompress(&self, src: &Path, dest: &Path) -> CacheResult<bool> {
        let content_type = detect_content_type(src)?;

        let Some(decompressor) = self.lookup(content_type) else {
            if src != dest {
                fs::rename(src, dest).map_err(|e| {
                    CacheError::io(format!("moving {} to {}", src.display(), dest.display()), e)
                })?;
            }
            return Ok(false);
        };

        info!("Decompressing {} ({})", dest.display(), content_type);

        let in_place = src == dest;
        let compressed = if in_place {
            let moved = with_suffix(src, ".tmp");
            fs::rename(src, &moved).map_err(|e| {
                CacheError::io(format!("moving {} aside for decompression", src.display()), e)
            })?;
            moved
        } else {
            src.to_path_buf()
        };

        let uncompressed = with_suffix(&compressed, "_uncompressed");
        if let Err(e) = decompressor(&compressed, &uncompressed) {
            if in_place {
                if let Err(restore) = fs::rename(&compressed, src) {
                    warn!(
                        "Could not restore {} after failed decompression: {}",
                        src.display(),
                        restore
                    );
                }
            }
            return Err(CacheError::io(
                format!("decompressing {} ({})", compressed.display(), content_type),
                e,
            ));
        }

        fs::remove_file(&compressed)
            .map_err(|e| CacheError::io(format!("removing {}", compressed.display()), e))?;
        fs::rename(&uncompressed, dest).map_err(|e| {
            CacheError::io(
                format!("moving {} to {}", uncompressed.display(), dest.display()),
                e,
            )
        })?;

        debug!("Decompressed {}", dest.display());
        Ok(true)
    }
}
