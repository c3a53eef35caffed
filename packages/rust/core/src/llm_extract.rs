//! LLM-assisted structured extraction.
//!
//! The whole candidate batch goes to the model in one call. Whatever comes
//! back is untrusted: items are tied back to corpus URLs here and the
//! literal-match gate in the validator has the final word.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use salarysignal_extract::detect_period;
use salarysignal_llm::{LlmItem, LlmOutput, LlmProvider, Prompt, parse_output};
use salarysignal_shared::{
    CandidateEntry, DiagnosticEvent, ExtractedRange, ExtractionStrategy, ModelStage, Result,
    SalarySignalError,
};

use crate::cascade::complete_with_ladder;

const INSTRUCTIONS: &str = "Extract salary ranges from the snippets below. \
Return only explicit ranges written in the text. Never infer or estimate a number. \
Copy each entry's \"url\" exactly. \
If a salary is monthly (e.g. €/mo, al mese, mensile), set \"period\" to \"monthly\" and keep the monthly numbers; \
if it is annual, set \"period\" to \"annual\". \
Output only a JSON array of objects: \
{ \"url\": \"...\", \"min\": number, \"max\": number, \"period\": \"annual\" | \"monthly\", \"company\": \"...\" }. \
Use the entry's company when it has one. If nothing qualifies, return [] only.";

#[derive(Serialize)]
struct PayloadEntry<'a> {
    url: &'a str,
    title: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<&'a str>,
}

/// Instructions plus the corpus serialized as JSON.
pub fn build_prompt(corpus: &[CandidateEntry]) -> Result<Prompt> {
    let entries: Vec<PayloadEntry<'_>> = corpus
        .iter()
        .map(|c| PayloadEntry {
            url: &c.url,
            title: &c.title,
            text: &c.text,
            company: c.company.as_deref(),
        })
        .collect();
    let payload = serde_json::to_string(&entries)
        .map_err(|e| SalarySignalError::parse(format!("failed to encode LLM payload: {e}")))?;

    Ok(Prompt {
        instructions: INSTRUCTIONS.to_string(),
        payload,
    })
}

/// Tie model items back to the corpus. Items without a known URL or any
/// bound are dropped; a single bound stands in for the missing one; a
/// missing period is read from the source text.
pub fn items_to_ranges(items: Vec<LlmItem>, corpus: &[CandidateEntry]) -> Vec<ExtractedRange> {
    items
        .into_iter()
        .filter_map(|item| {
            let url = item.url.as_deref()?.trim();
            let Some(source) = corpus.iter().find(|c| c.url == url) else {
                debug!(url, "model cited a URL outside the corpus");
                return None;
            };
            let (min, max) = match (item.min, item.max) {
                (Some(min), Some(max)) => (min, max),
                (Some(only), None) | (None, Some(only)) => (only, only),
                (None, None) => return None,
            };
            Some(ExtractedRange {
                url: source.url.clone(),
                min,
                max,
                period: item.period.unwrap_or_else(|| detect_period(&source.text)),
                company: source.company.clone().or(item.company),
                strategy: ExtractionStrategy::Llm,
            })
        })
        .collect()
}

/// Run the LLM strategy. Never fails: every problem becomes a diagnostic
/// event and an empty result.
#[instrument(skip_all, fields(entries = corpus.len()))]
pub async fn extract_with_llm(
    provider: Option<&dyn LlmProvider>,
    stages: &[ModelStage],
    corpus: &[CandidateEntry],
    events: &mut Vec<DiagnosticEvent>,
) -> Vec<ExtractedRange> {
    let Some(provider) = provider else {
        events.push(DiagnosticEvent::LlmSkipped {
            reason: "no LLM provider configured".into(),
        });
        return Vec::new();
    };
    if corpus.is_empty() {
        events.push(DiagnosticEvent::LlmSkipped {
            reason: "empty candidate corpus".into(),
        });
        return Vec::new();
    }

    let prompt = match build_prompt(corpus) {
        Ok(prompt) => prompt,
        Err(e) => {
            events.push(DiagnosticEvent::LlmFailed {
                reason: e.to_string(),
            });
            return Vec::new();
        }
    };

    let text = match complete_with_ladder(provider, stages, &prompt, events).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "LLM extraction failed");
            events.push(DiagnosticEvent::LlmFailed {
                reason: e.to_string(),
            });
            return Vec::new();
        }
    };

    match parse_output(&text) {
        LlmOutput::Items(items) => items_to_ranges(items, corpus),
        LlmOutput::NoVerifiedSalary => {
            debug!("model reported no verified salary");
            Vec::new()
        }
        LlmOutput::ExtractionFailed { reason } => {
            warn!(%reason, "unusable LLM output");
            events.push(DiagnosticEvent::LlmFailed { reason });
            Vec::new()
        }
    }
}
