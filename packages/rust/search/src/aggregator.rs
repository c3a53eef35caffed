//! Concurrent query fan-out with partial-failure tolerance.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use salarysignal_shared::{
    DiagnosticEvent, PipelineConfig, QueryTier, RawResult, SalarySignalError, SearchQuery,
};

use crate::SearchProvider;

/// Per-batch knobs.
#[derive(Debug, Clone, Copy)]
pub struct FanOutOptions {
    pub results_per_query: u32,
    /// Deadline applied to each call independently.
    pub per_query_timeout: Duration,
}

impl From<&PipelineConfig> for FanOutOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            results_per_query: config.results_per_query,
            per_query_timeout: Duration::from_millis(config.search_timeout_ms),
        }
    }
}

/// A query that did not contribute results.
#[derive(Debug)]
pub struct QueryFailure {
    pub query: String,
    pub error: SalarySignalError,
}

/// Settled outcome of a batch.
#[derive(Debug, Default)]
pub struct SearchBatch {
    /// Results of every successful query, in query order.
    pub results: Vec<RawResult>,
    pub succeeded: usize,
    pub failures: Vec<QueryFailure>,
}

impl SearchBatch {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when queries were issued and every one of them failed.
    pub fn all_failed(&self) -> bool {
        self.succeeded == 0 && !self.failures.is_empty()
    }

    /// Consume the batch, keeping the first failure.
    pub fn into_first_error(self) -> Option<SalarySignalError> {
        self.failures.into_iter().next().map(|f| f.error)
    }

    /// Diagnostic events describing this batch.
    pub fn events(&self, tier: QueryTier) -> Vec<DiagnosticEvent> {
        let mut events = vec![DiagnosticEvent::SearchBatch {
            tier,
            queries: self.succeeded + self.failures.len(),
            succeeded: self.succeeded,
            failed: self.failures.len(),
            results: self.results.len(),
        }];
        events.extend(self.failures.iter().map(|f| DiagnosticEvent::QueryFailed {
            query: f.query.clone(),
            error: f.error.to_string(),
        }));
        events
    }
}

/// Issue every query concurrently and wait for all of them to settle.
///
/// A failed or timed-out query is recorded and skipped; it never fails the
/// batch. Each result inherits the company of the query that produced it.
#[instrument(skip_all, fields(provider = provider.name(), queries = queries.len()))]
pub async fn fan_out(
    provider: &dyn SearchProvider,
    queries: &[SearchQuery],
    opts: FanOutOptions,
) -> SearchBatch {
    // Every query in flight at once; `buffered` hands outcomes back in query order.
    let settled: Vec<_> = stream::iter(queries)
        .map(|query| async move {
            let outcome = tokio::time::timeout(
                opts.per_query_timeout,
                provider.search(&query.text, opts.results_per_query),
            )
            .await
            .unwrap_or_else(|_| {
                Err(SalarySignalError::timeout(
                    "search query",
                    u64::try_from(opts.per_query_timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            });
            (query, outcome)
        })
        .buffered(queries.len().max(1))
        .boxed()
        .collect()
        .await;

    let mut batch = SearchBatch::default();
    for (query, outcome) in settled {
        match outcome {
            Ok(hits) => {
                batch.succeeded += 1;
                batch.results.extend(hits.into_iter().map(|hit| RawResult {
                    title: hit.title,
                    snippet: hit.snippet,
                    url: hit.link,
                    company: query.company.clone(),
                }));
            }
            Err(e) => {
                warn!(query = %query.text, error = %e, "search query failed");
                batch.failures.push(QueryFailure {
                    query: query.text.clone(),
                    error: e,
                });
            }
        }
    }

    info!(
        succeeded = batch.succeeded,
        failed = batch.failures.len(),
        results = batch.results.len(),
        "search batch settled"
    );
    batch
}
