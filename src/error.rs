//! Error types for the artifact cache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur while resolving, fetching or materializing an entry
#[derive(Error, Debug)]
pub enum CacheError {
    // Caller errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Upstream errors
    #[error("Bad upstream status for {url}: {status}")]
    Upstream { url: String, status: u16 },

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    // Integrity errors
    #[error("Checksum mismatch for {path}; expected={expected} found={actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Temporary file already exists: {0}")]
    Conflict(PathBuf),

    // Environment errors
    #[error("No user cache directory available on this platform")]
    NoCacheRoot,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid input error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Check if error is worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Integrity { .. } => {
                Some("The temporary download was kept next to the entry for inspection")
            }
            Self::Conflict(_) => Some("A staging file was left behind; remove it and retry"),
            Self::NoCacheRoot => Some("Set cache.root in the configuration file"),
            Self::InvalidInput(_) => Some("Pass an absolute URL such as https://host/file"),
            _ => None,
        }
    }
}
