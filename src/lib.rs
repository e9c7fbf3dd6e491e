//! artifact-cache - process-safe local cache for HTTP artifacts
//!
//! Downloads each URL once into a per-category directory under the user's
//! cache root, verifies an optional `sha256` query parameter and decompresses
//! known formats before the entry becomes visible. Concurrent callers, in
//! this process or any other, coordinate through per-entry lock files.

#[cfg(not(unix))]
compile_error!("artifact-cache relies on flock(2) and POSIX permissions and only supports Unix");

pub mod cache;
pub mod cli;
pub mod config;
pub mod decompress;
pub mod error;
pub mod ui;

pub use cache::{CacheDirResolver, DownloadCache, HttpTransport, Transport};
pub use decompress::DecompressorRegistry;
pub use error::{CacheError, CacheResult};
