//! Configuration schema for the artifact cache
//!
//! Configuration is stored at `~/.config/artifact-cache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application namespace segment under the user cache root
pub const DEFAULT_NAMESPACE: &str = "artifact-cache";

/// Category used by the image download helper
pub const IMAGE_CATEGORY: &str = "image";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache layout settings
    pub cache: CacheConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Override for the platform user cache directory
    pub root: Option<PathBuf>,

    /// Directory name placed between the cache root and the category dirs
    pub namespace: String,

    /// Category used by the `image` command
    pub image_category: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            image_category: IMAGE_CATEGORY.to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds; unset means wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    /// Timeout as a `Duration`, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.cache.namespace, "artifact-cache");
        assert_eq!(config.cache.image_category, "image");
        assert!(config.cache.root.is_none());
        assert!(config.http.timeout().is_none());
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
            [cache]
            root = "/var/cache/artifacts"

            [http]
            timeout_secs = 30
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.cache.root.as_deref(),
            Some(std::path::Path::new("/var/cache/artifacts"))
        );
        assert_eq!(config.cache.namespace, "artifact-cache");
        assert_eq!(config.http.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn serialize_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.cache.namespace, config.cache.namespace);
    }
}
