//! Cache directory resolution
//!
//! Entries live under `<user-cache-root>/<namespace>/<category>_cache/`. The
//! category directory is created on first use with owner-only permissions.

use crate::config::schema::{CacheConfig, DEFAULT_NAMESPACE};
use crate::error::{CacheError, CacheResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves (and lazily creates) per-category cache directories
#[derive(Debug, Clone)]
pub struct CacheDirResolver {
    /// Explicit root; `None` means the platform user cache directory
    root: Option<PathBuf>,
    namespace: String,
}

impl CacheDirResolver {
    /// Resolver rooted at the platform user cache directory
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            root: None,
            namespace: namespace.into(),
        }
    }

    /// Resolver rooted at an explicit directory
    pub fn with_root(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            namespace: namespace.into(),
        }
    }

    /// Build from the `[cache]` configuration section
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            root: config.root.clone(),
            namespace: config.namespace.clone(),
        }
    }

    /// `<root>/<namespace>`, without touching the filesystem
    pub fn base_dir(&self) -> CacheResult<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => dirs::cache_dir().ok_or(CacheError::NoCacheRoot)?,
        };
        Ok(root.join(&self.namespace))
    }

    /// `<root>/<namespace>/<category>_cache`, without touching the filesystem
    pub fn category_dir(&self, category: &str) -> CacheResult<PathBuf> {
        validate_category(category)?;
        Ok(self.base_dir()?.join(format!("{category}_cache")))
    }

    /// Return the directory for `category`, creating it if needed.
    ///
    /// Safe to call concurrently: losing a creation race to another process
    /// is not an error. Existing directories are not modified.
    pub fn resolve(&self, category: &str) -> CacheResult<PathBuf> {
        let dir = self.category_dir(category)?;

        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => return Ok(dir),
            Ok(_) => {
                return Err(CacheError::io(
                    format!("resolving cache directory {}", dir.display()),
                    io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::io(
                    format!("checking cache directory {}", dir.display()),
                    e,
                ))
            }
        }

        create_private_dir(&dir)?;
        debug!("Created cache directory {}", dir.display());
        Ok(dir)
    }
}

impl Default for CacheDirResolver {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// Categories become directory names, so they must be a single safe segment
fn validate_category(category: &str) -> CacheResult<()> {
    if category.is_empty() {
        return Err(CacheError::invalid("data type can't be an empty string"));
    }
    let safe = category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !safe || category.starts_with('.') {
        return Err(CacheError::invalid(format!(
            "category {category:?} is not a directory-safe label"
        )));
    }
    Ok(())
}

fn create_private_dir(dir: &Path) -> CacheResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .map_err(|e| CacheError::io(format!("creating cache directory {}", dir.display()), e))
}
