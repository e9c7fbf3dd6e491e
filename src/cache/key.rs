//! Cache keys and request-embedded checksums

use crate::error::{CacheError, CacheResult};
use sha2::{Digest, Sha256};
use url::Url;

/// Query parameter carrying the expected SHA-256 of the raw download
pub const CHECKSUM_PARAM: &str = "sha256";

/// Derive the entry file name from the raw URL string.
///
/// The digest only has to spread URLs apart; it is not a security boundary.
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Parse `url`, requiring an absolute URL with a host
pub fn parse_url(url: &str) -> CacheResult<Url> {
    let parsed =
        Url::parse(url).map_err(|e| CacheError::invalid(format!("invalid URL {url:?}: {e}")))?;
    if !parsed.has_host() {
        return Err(CacheError::invalid(format!("URL {url:?} has no host")));
    }
    Ok(parsed)
}

/// First non-empty `sha256` query value, if any
pub fn expected_checksum(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == CHECKSUM_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
