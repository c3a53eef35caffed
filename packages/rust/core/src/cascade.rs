//! Model cascade: walk the configured model ladder, downgrading on timeout.

use std::time::Duration;

use tracing::{info, instrument, warn};

use salarysignal_llm::{LlmProvider, Prompt};
use salarysignal_shared::{DiagnosticEvent, ModelStage, Result, SalarySignalError};

/// Run `prompt` on each stage in order until one answers.
///
/// Only a timeout moves to the next stage; any other error is returned as
/// is. When every stage times out, the last timeout is returned.
#[instrument(skip_all, fields(provider = provider.name(), stages = stages.len()))]
pub async fn complete_with_ladder(
    provider: &dyn LlmProvider,
    stages: &[ModelStage],
    prompt: &Prompt,
    events: &mut Vec<DiagnosticEvent>,
) -> Result<String> {
    let mut last_timeout = None;

    for (i, stage) in stages.iter().enumerate() {
        let deadline = Duration::from_millis(stage.timeout_ms);
        let outcome = tokio::time::timeout(deadline, provider.complete(stage, prompt))
            .await
            .unwrap_or_else(|_| Err(SalarySignalError::timeout(format!("model {}", stage.name), stage.timeout_ms)));

        match outcome {
            Ok(text) => {
                info!(model = %stage.name, "model answered");
                return Ok(text);
            }
            Err(e) if e.is_timeout() => {
                if let Some(next) = stages.get(i + 1) {
                    warn!(from = %stage.name, to = %next.name, "model timed out, downgrading");
                    events.push(DiagnosticEvent::ModelDowngrade {
                        from: stage.name.clone(),
                        to: next.name.clone(),
                        after_ms: stage.timeout_ms,
                    });
                }
                last_timeout = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_timeout.unwrap_or_else(|| SalarySignalError::config("no LLM model configured")))
}
