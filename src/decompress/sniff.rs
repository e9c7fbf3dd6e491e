//! Content sniffing from a short byte prefix
//!
//! Classifies a file by its magic bytes rather than its name. The table follows
//! the WHATWG MIME sniffing signatures for the binary formats likely to show up
//! in downloaded artifacts, with the usual text/binary fallback.

use crate::error::{CacheError, CacheResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Number of bytes inspected when sniffing
pub const SNIFF_LEN: usize = 512;

/// Media type reported for gzip streams
pub const GZIP: &str = "application/x-gzip";

/// Fallback for prefixes without binary control bytes
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Fallback for anything else
pub const OCTET_STREAM: &str = "application/octet-stream";

enum Signature {
    /// Prefix must match exactly
    Exact(&'static [u8], &'static str),
    /// `prefix[i] & mask[i] == pattern[i]` for every byte of the pattern
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        content_type: &'static str,
    },
    /// Like `Exact`, after skipping leading whitespace
    Text(&'static [u8], &'static str),
}

impl Signature {
    fn matches(&self, data: &[u8]) -> Option<&'static str> {
        match self {
            Self::Exact(pattern, ct) => data.starts_with(pattern).then_some(*ct),
            Self::Masked {
                mask,
                pattern,
                content_type,
            } => {
                if data.len() < pattern.len() {
                    return None;
                }
                let hit = data
                    .iter()
                    .zip(mask.iter())
                    .zip(pattern.iter())
                    .all(|((d, m), p)| d & m == *p);
                hit.then_some(*content_type)
            }
            Self::Text(pattern, ct) => {
                let start = data
                    .iter()
                    .position(|b| !is_whitespace(*b))
                    .unwrap_or(data.len());
                let rest = &data[start..];
                (rest.len() >= pattern.len()
                    && rest[..pattern.len()].eq_ignore_ascii_case(pattern))
                .then_some(*ct)
            }
        }
    }
}

const SIGNATURES: &[Signature] = &[
    Signature::Text(b"<?xml", "text/xml; charset=utf-8"),
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    Signature::Exact(b"\xFE\xFF", "text/plain; charset=utf-16be"),
    Signature::Exact(b"\xFF\xFE", "text/plain; charset=utf-16le"),
    Signature::Exact(b"\xEF\xBB\xBF", TEXT_PLAIN),
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        content_type: "image/webp",
    },
    Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WAVE",
        content_type: "audio/wave",
    },
    Signature::Exact(b"ID3", "audio/mpeg"),
    Signature::Exact(b"OggS\x00", "application/ogg"),
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    Signature::Exact(b"\x1F\x8B\x08", GZIP),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    Signature::Exact(b"\xFD7zXZ\x00", "application/x-xz"),
    Signature::Exact(b"BZh", "application/x-bzip2"),
    Signature::Exact(b"\x28\xB5\x2F\xFD", "application/zstd"),
    Signature::Exact(b"\x00asm", "application/wasm"),
];

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// ISO-BMFF (mp4 family): `size` box header followed by `ftyp` and an mp4 brand
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size % 4 != 0 || data.len() < box_size || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        .filter(|&i| i != 12)
        .any(|i| data.get(i..i + 3) == Some(b"mp4".as_slice()))
}

/// Classify a byte prefix. Only the first [`SNIFF_LEN`] bytes are considered.
pub fn sniff(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(ct) = SIGNATURES.iter().find_map(|sig| sig.matches(data)) {
        return ct;
    }
    if is_mp4(data) {
        return "video/mp4";
    }
    if data.iter().any(|b| is_binary_byte(*b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

/// Read up to [`SNIFF_LEN`] bytes of `path` and classify them.
///
/// An empty file is classified as plain text rather than treated as an error.
pub fn detect_content_type(path: &Path) -> CacheResult<&'static str> {
    let file = File::open(path)
        .map_err(|e| CacheError::io(format!("opening {} for sniffing", path.display()), e))?;

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| CacheError::io(format!("reading {} for sniffing", path.display()), e))?;

    let content_type = sniff(&prefix);
    debug!("Content type of {} is {}", path.display(), content_type);
    Ok(content_type)
}
