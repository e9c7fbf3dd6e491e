//! Disk-resident cache for artifacts fetched over HTTP
//!
//! Entries are keyed by a digest of their source URL and shared by every
//! process on the machine. Entries are immutable once promoted and are never
//! evicted by this crate.
//!
//! # Layout
//!
//! ```text
//! <user-cache-root>/<namespace>/<category>_cache/<key>
//! <key>.lock                 held while an entry is written
//! <key>.tmp                  staging file of an attempt in progress (or crashed)
//! <key>.tmp_uncompressed     decompression output before promotion
//! ```
//!
//! # Entry States
//!
//! | State | Visible at `<key>` | Description |
//! |-------|--------------------|-------------|
//! | Absent | no | Nothing downloaded yet |
//! | Writing | no | Lock held, staging file being filled and verified |
//! | Present | yes | Complete, verified and decompressed |

pub mod dir;
pub mod download;
pub mod entry;
pub mod key;
pub mod lock;
pub mod materialize;
pub mod transport;
pub mod verify;

pub use dir::CacheDirResolver;
pub use download::DownloadCache;
pub use entry::{format_bytes, list_entries, CacheEntry};
pub use key::{cache_key, expected_checksum, parse_url};
pub use lock::{critical_section, FileLock};
pub use materialize::Materializer;
pub use transport::{Download, HttpTransport, Transport};
