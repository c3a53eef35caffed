//! Perplexity chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use salarysignal_shared::{ModelStage, ProviderConfig, Result, SalarySignalError, resolve_api_key};

use crate::http::{build_client, send_json};
use crate::{LlmProvider, Prompt};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `{endpoint}/chat/completions`.
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PerplexityClient {
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
impl LlmProvider for PerplexityClient {
    #[instrument(skip_all, fields(model = %stage.name, timeout_ms = stage.timeout_ms))]
    async fn complete(&self, stage: &ModelStage, prompt: &Prompt) -> Result<String> {
        let body = ChatRequest {
            model: &stage.name,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.instructions,
                },
                Message {
                    role: "user",
                    content: &prompt.payload,
                },
            ],
            temperature: 0.2,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: ChatResponse =
            send_json(request, "perplexity chat completion", stage.timeout_ms).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SalarySignalError::InvalidResponse("perplexity: empty choices".into()))?;

        debug!(chars = text.len(), "perplexity completion");
        Ok(text)
    }

    fn name(&self) -> &str {
        "perplexity"
    }
}
