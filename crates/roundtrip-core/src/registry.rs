//! Registry read access

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{Result, RoundtripError};

/// Default deadline for one registry read
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads stored records back from the registry
#[async_trait]
pub trait Registry: Send + Sync {
    /// Base URL published records are submitted to
    fn base_url(&self) -> &str;

    /// Fetch the record stored under `id`
    async fn fetch_server(&self, id: &str) -> Result<Value>;
}

/// Registry client speaking the `GET /v0/servers/{id}` read endpoint
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    /// Create a client whose requests are each bounded by `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RoundtripError::config_error(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of the stored record for `id`
    pub fn server_url(&self, id: &str) -> String {
        format!("{}/v0/servers/{}", self.base_url, id)
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_server(&self, id: &str) -> Result<Value> {
        let url = self.server_url(id);
        debug!("GET {}", url);

        let request_error = |source| RoundtripError::RegistryRequest {
            url: url.clone(),
            source,
        };
        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            return Err(RoundtripError::RegistryStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| RoundtripError::RegistryDecode { source })
    }
}
