//! Reachability probing

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::util::parse_endpoint_url;

/// Determines internet reachability independently of link state.
///
/// Returns `None` when reachability cannot be determined.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> Option<bool>;
}

/// Probes reachability with a `HEAD` request to a health endpoint
#[derive(Clone)]
pub struct HttpReachabilityProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpReachabilityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = parse_endpoint_url(&url.into(), "reachability_url")?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build probe client: {error}")))?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self) -> Option<bool> {
        match self.client.head(&self.url).send().await {
            Ok(response) => Some(response.status().is_success()),
            Err(error) if error.is_timeout() || error.is_connect() || error.is_request() => {
                tracing::debug!("Reachability probe failed: {error}");
                Some(false)
            }
            Err(error) => {
                tracing::debug!("Reachability undetermined: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpReachabilityProbe::new("example.com/health", Duration::from_secs(1)).is_err());
        assert!(HttpReachabilityProbe::new("   ", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn trims_url() {
        let probe =
            HttpReachabilityProbe::new(" https://example.com/health ", Duration::from_secs(1))
                .unwrap();
        assert_eq!(probe.url(), "https://example.com/health");
    }

    #[tokio::test]
    async fn unroutable_host_is_unreachable() {
        // Port 9 on localhost is never served in test environments
        let probe =
            HttpReachabilityProbe::new("http://127.0.0.1:9/health", Duration::from_millis(500))
                .unwrap();
        assert_eq!(probe.probe().await, Some(false));
    }
}
