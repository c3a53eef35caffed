//! Web search provider integration.
//!
//! The pipeline only needs organic results for a query string, so the
//! provider seam is a single async method. [`SerperClient`] is the
//! production implementation; [`fan_out`] issues a batch of queries
//! concurrently and keeps whatever succeeds.

mod aggregator;
mod serper;

use async_trait::async_trait;
use serde::Deserialize;

use salarysignal_shared::Result;

pub use aggregator::{FanOutOptions, QueryFailure, SearchBatch, fan_out};
pub use serper::SerperClient;

/// One organic hit as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

/// A search backend returning organic results for a query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, asking for at most `num` results.
    async fn search(&self, query: &str, num: u32) -> Result<Vec<OrganicResult>>;

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}
