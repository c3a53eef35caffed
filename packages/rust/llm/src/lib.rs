//! LLM provider integration for structured salary extraction.
//!
//! Providers only turn a prompt into free text. Everything that makes that
//! text trustworthy (JSON recovery, shape checks, field aliases) lives in
//! [`output`], and the literal-match gate downstream decides what survives.

mod gemini;
mod http;
pub mod output;
mod perplexity;

use std::sync::Arc;

use async_trait::async_trait;

use salarysignal_shared::{LlmConfig, LlmProviderKind, ModelStage, Result};

pub use gemini::GeminiClient;
pub use output::{LlmItem, LlmOutput, extract_json_block, parse_output};
pub use perplexity::PerplexityClient;

/// What gets sent to the model: fixed instructions plus the candidate
/// payload serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instructions: String,
    pub payload: String,
}

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run `prompt` on one model stage, honoring the stage's timeout.
    /// A deadline overrun must surface as `SalarySignalError::Timeout`.
    async fn complete(&self, stage: &ModelStage, prompt: &Prompt) -> Result<String>;

    fn name(&self) -> &str;
}

/// Build the provider selected in `[llm]`. Fails with a config error when
/// its API key is not set.
pub fn provider_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    Ok(match config.provider {
        LlmProviderKind::Gemini => Arc::new(GeminiClient::from_config(&config.gemini)?),
        LlmProviderKind::Perplexity => Arc::new(PerplexityClient::from_config(&config.perplexity)?),
    })
}
