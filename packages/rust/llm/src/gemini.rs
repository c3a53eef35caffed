//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use salarysignal_shared::{ModelStage, ProviderConfig, Result, SalarySignalError, resolve_api_key};

use crate::http::{build_client, send_json};
use crate::{LlmProvider, Prompt};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for `{endpoint}/v1beta/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        Self::new(&config.endpoint, api_key)
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    #[instrument(skip_all, fields(model = %stage.name, timeout_ms = stage.timeout_ms))]
    async fn complete(&self, stage: &ModelStage, prompt: &Prompt) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, stage.name
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part {
                        text: &prompt.instructions,
                    },
                    Part {
                        text: &prompt.payload,
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let request = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        let response: GenerateResponse =
            send_json(request, "gemini generateContent", stage.timeout_ms).await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .ok_or_else(|| SalarySignalError::InvalidResponse("gemini: no candidates".into()))?;

        debug!(chars = text.len(), "gemini completion");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt() -> Prompt {
        Prompt {
            instructions: "Extract salary ranges.".into(),
            payload: "[]".into(),
        }
    }

    #[tokio::test]
    async fn joins_candidate_parts() {
        let server = MockServer::start().await;
        let fixture = std::fs::read_to_string("../../../fixtures/gemini/response.json")
            .expect("read gemini fixture");

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "temperature": 0.0 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "g-key").unwrap();
        let text = client
            .complete(&ModelStage::new("gemini-2.5-flash", 5_000), &prompt())
            .await
            .unwrap();

        assert!(text.starts_with("```json"));
        assert!(text.contains("\"min\": 40000"));
    }

    #[tokio::test]
    async fn empty_candidates_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "g-key").unwrap();
        let err = client
            .complete(&ModelStage::new("gemini-2.5-flash", 5_000), &prompt())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn stage_timeout_surfaces_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "g-key").unwrap();
        let err = client
            .complete(&ModelStage::new("gemini-2.5-flash", 50), &prompt())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(server.uri(), "g-key").unwrap();
        let err = client
            .complete(&ModelStage::new("gemini-2.5-flash", 5_000), &prompt())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert!(!err.is_timeout());
    }
}
