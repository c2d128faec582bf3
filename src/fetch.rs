//! Retrieval of rendition bytes
//!
//! The downloader only depends on the [`Fetch`] trait; [`HttpFetcher`] is the
//! blocking HTTP implementation used by the binary. One attempt per asset,
//! no retries.

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::trace;

/// Upper bound on a single rendition body
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Source of rendition bytes
pub trait Fetch {
    /// Retrieve the full body at `url`
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher backed by a shared `ureq` agent
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self.agent.get(url).call().map_err(|e| Error::Retrieval {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| Error::Retrieval {
                url: url.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        trace!(url, size = bytes.len(), "Fetched rendition");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_host_is_retrieval_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2));
        let result = fetcher.fetch("http://127.0.0.1:9/media/123.jpg");
        assert!(matches!(result, Err(Error::Retrieval { .. })));
    }

    #[test]
    fn test_invalid_url_is_retrieval_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2));
        let result = fetcher.fetch("not a url");
        assert!(matches!(result, Err(Error::Retrieval { .. })));
    }
}
