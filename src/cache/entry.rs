//! Read-only view of completed cache entries

use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// A promoted entry in a category directory
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// File name (hex digest of the source URL)
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// List completed entries in `dir`, newest first.
///
/// Lock, staging and decompression siblings are skipped. A missing directory
/// has no entries.
pub fn list_entries(dir: &Path) -> CacheResult<Vec<CacheEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(format!("reading {}", dir.display()), e)),
    };

    let mut entries = Vec::new();
    for item in read_dir {
        let item = item.map_err(|e| CacheError::io(format!("reading {}", dir.display()), e))?;
        let Some(key) = item.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if key.contains('.') {
            continue;
        }

        let meta = match item.metadata() {
            Ok(meta) => meta,
            // Renamed away between readdir and stat (e.g. in-place decompression)
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(CacheError::io(
                    format!("inspecting {}", item.path().display()),
                    e,
                ))
            }
        };
        if !meta.is_file() {
            continue;
        }

        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        entries.push(CacheEntry {
            key,
            path: item.path(),
            size_bytes: meta.len(),
            modified,
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.key.cmp(&b.key)));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn skips_siblings() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("abc123"), b"12345").unwrap();
        fs::write(temp.path().join("abc123.lock"), b"").unwrap();
        fs::write(temp.path().join("def456.tmp"), b"partial").unwrap();
        fs::write(temp.path().join("def456.tmp_uncompressed"), b"partial").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();

        let entries = list_entries(temp.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "abc123");
        assert_eq!(entries[0].size_bytes, 5);
    }

    #[test]
    fn missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_entries(&temp.path().join("nope")).unwrap().is_empty());
    }
}
