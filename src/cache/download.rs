//! Download cache façade
//!
//! Maps a URL and a category to a local file, downloading on a miss.

use crate::cache::dir::CacheDirResolver;
use crate::cache::key::{cache_key, expected_checksum, parse_url};
use crate::cache::lock::critical_section;
use crate::cache::materialize::{lock_path, Materializer};
use crate::cache::transport::{HttpTransport, Transport};
use crate::config::schema::{Config, IMAGE_CATEGORY};
use crate::decompress::DecompressorRegistry;
use crate::error::{CacheError, CacheResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Local cache of remote artifacts
pub struct DownloadCache<T = HttpTransport> {
    resolver: CacheDirResolver,
    materializer: Materializer,
    transport: T,
    image_category: String,
}

impl<T: Transport> DownloadCache<T> {
    /// Cache laid out from file settings with the standard decompressors
    pub fn from_config(config: &Config, transport: T) -> Self {
        Self::new(
            CacheDirResolver::from_config(&config.cache),
            Arc::new(DecompressorRegistry::standard()),
            transport,
        )
        .with_image_category(config.cache.image_category.clone())
    }

    pub fn new(
        resolver: CacheDirResolver,
        registry: Arc<DecompressorRegistry>,
        transport: T,
    ) -> Self {
        Self {
            resolver,
            materializer: Materializer::new(registry),
            transport,
            image_category: IMAGE_CATEGORY.to_string(),
        }
    }

    /// Override the category used by [`Self::fetch_image`]
    pub fn with_image_category(mut self, category: impl Into<String>) -> Self {
        self.image_category = category.into();
        self
    }

    pub fn resolver(&self) -> &CacheDirResolver {
        &self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Path the entry for `url` would occupy, creating the category directory
    pub fn entry_path(&self, url: &str, category: &str) -> CacheResult<PathBuf> {
        parse_url(url)?;
        let dir = self.resolver.resolve(category)?;
        Ok(dir.join(cache_key(url)))
    }

    /// Return a local path holding the content of `url`, downloading it on a miss.
    ///
    /// A `sha256` query parameter in `url` is checked against the raw
    /// downloaded bytes. Known compressed formats are decompressed before the
    /// entry becomes visible.
    pub fn fetch(&self, url: &str, category: &str) -> CacheResult<PathBuf> {
        let parsed = parse_url(url)?;
        let dir = self.resolver.resolve(category)?;
        let path = dir.join(cache_key(url));

        match fs::metadata(&path) {
            Ok(_) => {
                info!("The file was found in cache: {}. Reusing...", path.display());
                self.finish_decompression(&path)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::io(format!("checking {}", path.display()), e));
            }
        }

        debug!("Cache miss for {}", url);
        let checksum = expected_checksum(&parsed);
        let download = self.transport.get(&parsed)?;
        self.materializer
            .materialize(download.reader, &path, checksum.as_deref())?;

        Ok(path)
    }

    /// [`Self::fetch`] into the image category
    pub fn fetch_image(&self, url: &str) -> CacheResult<PathBuf> {
        info!("Obtaining image file from '{}'", url);
        self.fetch(url, &self.image_category)
    }

    /// Decompress an existing entry left compressed by an interrupted run.
    ///
    /// Already-decompressed entries are never locked; only entries that still
    /// sniff as a registered format are rewritten, under the entry lock.
    fn finish_decompression(&self, path: &Path) -> CacheResult<()> {
        let registry = self.materializer.registry();
        let compressed = match registry.is_compressed(path) {
            Ok(compressed) => compressed,
            // Moved aside by a concurrent decompression; wait for it under the lock
            Err(CacheError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e),
        };
        if !compressed {
            return Ok(());
        }

        critical_section(&lock_path(path), || {
            if !path.exists() {
                return Ok(());
            }
            registry.decompress_in_place(path).map(|_| ())
        })
    }
}
