//! HTTP transport used on cache misses

use crate::config::schema::HttpConfig;
use crate::error::{CacheError, CacheResult};
use std::io::Read;
use url::Url;

/// An open response body
pub struct Download {
    /// Body stream
    pub reader: Box<dyn Read + Send>,
    /// Declared body length, when the server sent one
    pub content_length: Option<u64>,
}

/// Source of remote artifacts
///
/// Implementations perform a single GET and must report any non-2xx status as
/// [`CacheError::Upstream`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> CacheResult<Download>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url) -> CacheResult<Download> {
        (**self).get(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &Url) -> CacheResult<Download> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport backed by `ureq`
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Create a transport; without a configured timeout requests may block indefinitely
    pub fn new(config: &HttpConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> CacheResult<Download> {
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| CacheError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response
            .headers()
            .get(ureq::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        Ok(Download {
            reader: Box::new(response.into_body().into_reader()),
            content_length,
        })
    }
}
