//! HTTP remote

use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteApi, RemoteError, RemoteResult};
use crate::error::{Error, Result};
use crate::models::SyncOperation;
use crate::util::{body_excerpt, parse_endpoint_url};

const SYNC_PATH: &str = "/v1/orders/sync";

/// Posts each operation as `{"type": ..., "payload": {...}}` to
/// `{base_url}/v1/orders/sync`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = parse_endpoint_url(&base_url.into(), "remote_url")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            endpoint: format!("{base_url}{SYNC_PATH}"),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn push(&self, operation: &SyncOperation) -> RemoteResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(operation)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected {
                status,
                body: body_excerpt(&body),
            });
        }

        Ok(())
    }
}
