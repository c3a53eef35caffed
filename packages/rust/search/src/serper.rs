//! Serper (`google.serper.dev`) search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use salarysignal_shared::{Result, SalarySignalError, SearchConfig, resolve_api_key};

use crate::{OrganicResult, SearchProvider};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("SalarySignal/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u32,
    gl: &'a str,
    hl: &'a str,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// Client for the Serper search API.
#[derive(Debug, Clone)]
pub struct SerperClient {
    client: Client,
    endpoint: String,
    api_key: String,
    country: String,
    language: String,
    timeout_ms: u64,
}

impl SerperClient {
    /// Build a client. `timeout` applies to every call.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        country: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SalarySignalError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            country: country.into(),
            language: language.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Build a client from the `[search]` config section, resolving the key
    /// from the environment. A missing key is a config error.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        Self::new(
            &config.endpoint,
            api_key,
            &config.country,
            &config.language,
            Duration::from_millis(config.timeout_ms),
        )
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    #[instrument(skip_all, fields(query = %query, num))]
    async fn search(&self, query: &str, num: u32) -> Result<Vec<OrganicResult>> {
        let body = SerperRequest {
            q: query,
            num,
            gl: &self.country,
            hl: &self.language,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                SalarySignalError::transport("serper search", self.timeout_ms, e.is_timeout(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SalarySignalError::upstream(status.as_u16(), &text));
        }

        let parsed: SerperResponse = response.json().await.map_err(|e| {
            SalarySignalError::decode("serper search", self.timeout_ms, e.is_timeout(), e)
        })?;

        debug!(results = parsed.organic.len(), "serper response");
        Ok(parsed.organic)
    }

    fn name(&self) -> &str {
        "serper"
    }
}
