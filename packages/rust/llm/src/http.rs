//! HTTP plumbing shared by the provider clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use salarysignal_shared::{Result, SalarySignalError};

/// User-Agent string for LLM requests.
const USER_AGENT: &str = concat!("SalarySignal/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SalarySignalError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send `request` with a per-call deadline and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    operation: &str,
    timeout_ms: u64,
) -> Result<T> {
    let response = request
        .timeout(Duration::from_millis(timeout_ms))
        .send()
        .await
        .map_err(|e| SalarySignalError::transport(operation, timeout_ms, e.is_timeout(), e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(SalarySignalError::upstream(status.as_u16(), &text));
    }

    response
        .json()
        .await
        .map_err(|e| SalarySignalError::decode(operation, timeout_ms, e.is_timeout(), e))
}
