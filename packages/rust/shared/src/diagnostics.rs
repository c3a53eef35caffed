//! Structured per-request diagnostics.
//!
//! Every pipeline run returns a [`Diagnostics`] record next to its result,
//! so callers can see which stages ran and why a request ended the way it
//! did without scraping logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{ExtractionStrategy, QueryTier};

/// One notable thing that happened while serving a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// A batch of search queries settled.
    SearchBatch {
        tier: QueryTier,
        queries: usize,
        succeeded: usize,
        failed: usize,
        results: usize,
    },
    /// A single search query failed; the batch carried on without it.
    QueryFailed { query: String, error: String },
    /// Raw results were narrowed to the candidate corpus.
    CandidatesFiltered {
        tier: QueryTier,
        raw: usize,
        kept: usize,
    },
    /// An extraction strategy ran over the corpus.
    Extraction {
        tier: QueryTier,
        strategy: ExtractionStrategy,
        extracted: usize,
        validated: usize,
    },
    /// The LLM strategy was not attempted.
    LlmSkipped { reason: String },
    /// The LLM strategy ran but produced nothing usable.
    LlmFailed { reason: String },
    /// A model stage timed out and the next one was tried.
    ModelDowngrade {
        from: String,
        to: String,
        after_ms: u64,
    },
    /// The pipeline moved on to the next query tier.
    TierEscalated { to: QueryTier, reason: String },
}

/// Ordered record of a single request's pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub events: Vec<DiagnosticEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            started_at: Utc::now(),
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, event: DiagnosticEvent) {
        self.events.push(event);
    }

    /// Absorb the events of a sub-run (e.g. one tier) in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = DiagnosticEvent>) {
        self.events.extend(events);
    }

    /// Tiers for which a search batch was issued, in order.
    pub fn searched_tiers(&self) -> Vec<QueryTier> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::SearchBatch { tier, .. } => Some(*tier),
                _ => None,
            })
            .collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_tagged() {
        let event = DiagnosticEvent::TierEscalated {
            to: QueryTier::Reports,
            reason: "no candidates".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"tier_escalated""#));
        assert!(json.contains(r#""to":"reports""#));
    }

    #[test]
    fn searched_tiers_in_order() {
        let mut diag = Diagnostics::new();
        for tier in [QueryTier::Strict, QueryTier::Relaxed] {
            diag.record(DiagnosticEvent::SearchBatch {
                tier,
                queries: 3,
                succeeded: 3,
                failed: 0,
                results: 0,
            });
        }
        assert_eq!(
            diag.searched_tiers(),
            vec![QueryTier::Strict, QueryTier::Relaxed]
        );
    }
}
