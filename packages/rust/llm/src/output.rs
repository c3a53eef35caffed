//! Parse-or-fail step for free-form model output.
//!
//! Models wrap JSON in prose or markdown fences, pick their own envelope and
//! spell fields several ways. [`parse_output`] recovers what it can and
//! returns a tagged [`LlmOutput`]; it never errors.

use serde::Serialize;
use serde_json::{Map, Value};

use salarysignal_extract::parse_number;
use salarysignal_shared::{NO_VERIFIED_SALARY, Period};

const URL_KEYS: &[&str] = &["url", "link", "link_fonte", "source"];
const MIN_KEYS: &[&str] = &["min", "ral_min", "salary_min"];
const MAX_KEYS: &[&str] = &["max", "ral_max", "salary_max"];
const COMPANY_KEYS: &[&str] = &["competitor", "company"];
const LIST_KEYS: &[&str] = &["items", "results", "ranges"];

/// One range as the model reported it. Every field is optional; callers
/// decide what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmItem {
    pub url: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub period: Option<Period>,
    pub company: Option<String>,
}

/// Outcome of interpreting a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutput {
    /// Structured items (possibly none).
    Items(Vec<LlmItem>),
    /// The model explicitly said nothing verifiable was found.
    NoVerifiedSalary,
    /// Nothing structured could be recovered.
    ExtractionFailed { reason: String },
}

impl LlmOutput {
    /// Items, treating every non-structured outcome as empty.
    pub fn into_items(self) -> Vec<LlmItem> {
        match self {
            Self::Items(items) => items,
            Self::NoVerifiedSalary | Self::ExtractionFailed { .. } => Vec::new(),
        }
    }
}

/// Locate the JSON part of a completion: a ```json fence, any fence holding
/// JSON, then the widest bracketed span starting at the first `[` or `{`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let block = after[..end].trim();
            if block.starts_with('{') || block.starts_with('[') {
                return Some(block);
            }
        }
    }

    let start = trimmed.find(['[', '{'])?;
    let close = if trimmed[start..].starts_with('[') { ']' } else { '}' };
    let end = trimmed.rfind(close)?;
    (start < end).then(|| &trimmed[start..=end])
}

/// Interpret a raw completion.
pub fn parse_output(text: &str) -> LlmOutput {
    let Some(block) = extract_json_block(text) else {
        return LlmOutput::ExtractionFailed {
            reason: "no JSON found in model output".into(),
        };
    };

    let value: Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(e) => {
            return LlmOutput::ExtractionFailed {
                reason: format!("invalid JSON: {e}"),
            };
        }
    };

    match value {
        Value::Array(entries) => LlmOutput::Items(items_from(&entries)),
        Value::Object(obj) => {
            if obj.get("error").and_then(Value::as_str) == Some(NO_VERIFIED_SALARY) {
                return LlmOutput::NoVerifiedSalary;
            }
            if let Some(entries) = LIST_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_array))
            {
                return LlmOutput::Items(items_from(entries));
            }
            match item_from(&obj) {
                Some(item) => LlmOutput::Items(vec![item]),
                None => LlmOutput::ExtractionFailed {
                    reason: "unexpected JSON object shape".into(),
                },
            }
        }
        _ => LlmOutput::ExtractionFailed {
            reason: "JSON is neither an array nor an object".into(),
        },
    }
}

fn items_from(entries: &[Value]) -> Vec<LlmItem> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(item_from)
        .collect()
}

/// An object counts as an item only if it carries at least one bound.
fn item_from(obj: &Map<String, Value>) -> Option<LlmItem> {
    let min = number_field(obj, MIN_KEYS);
    let max = number_field(obj, MAX_KEYS);
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(LlmItem {
        url: string_field(obj, URL_KEYS),
        min,
        max,
        period: string_field(obj, &["period"]).and_then(|p| parse_period(&p)),
        company: string_field(obj, COMPANY_KEYS),
    })
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    })
}

fn parse_period(raw: &str) -> Option<Period> {
    match raw.trim().to_lowercase().as_str() {
        "monthly" | "month" | "mensile" | "mese" => Some(Period::Monthly),
        "annual" | "yearly" | "year" | "annuale" | "annuo" => Some(Period::Annual),
        _ => None,
    }
}
