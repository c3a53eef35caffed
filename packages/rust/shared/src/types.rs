//! Core domain types for the salary-signal pipeline.
//!
//! Data flows leaves-first through these types:
//! [`SearchQuery`] → [`RawResult`] → [`CandidateEntry`] → [`ExtractedRange`]
//! → [`ValidatedRange`] → [`Benchmark`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalarySignalError};

/// Sentinel reported when no range survives validation.
pub const NO_VERIFIED_SALARY: &str = "no_verified_salary";

// ---------------------------------------------------------------------------
// Queries and raw results
// ---------------------------------------------------------------------------

/// Query tier: strict queries carry salary keywords, relaxed ones do not.
/// The reports tier searches salary-report sites once job postings are
/// exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTier {
    Strict,
    Relaxed,
    Reports,
}

impl QueryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
            Self::Reports => "reports",
        }
    }
}

impl std::fmt::Display for QueryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single search-provider query, tagged with the context it was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Full query string, including `site:` restriction.
    pub text: String,
    /// Tier the query belongs to.
    pub tier: QueryTier,
    /// Company the query targets (competitor variant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// One organic search hit, tagged with its originating query's company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl RawResult {
    /// Title and snippet joined, as used for relevance and extraction.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.snippet).trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Candidate corpus
// ---------------------------------------------------------------------------

/// A deduplicated, relevant search hit. Its `url` is the unique key and also
/// the identifier the LLM must echo back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub url: String,
    pub title: String,
    /// Title + snippet, the only text ranges may be extracted from.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl From<&RawResult> for CandidateEntry {
    fn from(raw: &RawResult) -> Self {
        Self {
            url: raw.url.clone(),
            title: raw.title.clone(),
            text: raw.combined_text(),
            company: raw.company.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Pay period a figure is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Annual,
    Monthly,
}

/// Which extraction strategy produced a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Pattern,
    Llm,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Llm => "llm",
        }
    }
}

/// A raw (min, max, period) triple pulled out of a candidate. Untrusted until
/// it passes validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRange {
    pub url: String,
    pub min: f64,
    pub max: f64,
    pub period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub strategy: ExtractionStrategy,
}

/// An annual range that is ordered, plausible and literally present in the
/// text of the candidate identified by `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRange {
    pub url: String,
    pub title: String,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub strategy: ExtractionStrategy,
}

impl ValidatedRange {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Single distribution folded from every validated range of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Smallest lower bound.
    pub min: f64,
    /// Rounded mean of per-source midpoints.
    pub med: f64,
    /// Largest upper bound.
    pub max: f64,
    /// Contributing URLs, first-seen order, no duplicates.
    pub sources: Vec<String>,
}

/// Terminal outcome of a benchmark: data, or the explicit no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Benchmark {
    Verified(BenchmarkSummary),
    NoVerifiedSalary,
}

impl Benchmark {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// Contributing sources; always empty for the sentinel.
    pub fn sources(&self) -> &[String] {
        match self {
            Self::Verified(summary) => &summary.sources,
            Self::NoVerifiedSalary => &[],
        }
    }

    /// JSON payload returned to callers.
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            Self::Verified(summary) => serde_json::json!({
                "min": summary.min,
                "med": summary.med,
                "max": summary.max,
                "sources": summary.sources,
            }),
            Self::NoVerifiedSalary => serde_json::json!({
                "error": NO_VERIFIED_SALARY,
                "sources": [],
            }),
        }
    }
}

/// One row of the competitor benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorRange {
    pub competitor: String,
    pub min: f64,
    pub max: f64,
    pub title: String,
    pub link: String,
    pub location: String,
}

// ---------------------------------------------------------------------------
// Inbound requests
// ---------------------------------------------------------------------------

/// Single-role benchmark request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub location: String,
}

impl RoleRequest {
    /// Trim every field and reject empty ones.
    pub fn validate(&self) -> Result<RoleRequest> {
        let role = self.role.trim();
        let location = self.location.trim();
        if role.is_empty() || location.is_empty() {
            return Err(SalarySignalError::bad_request("Missing role or location"));
        }
        Ok(RoleRequest {
            role: role.to_string(),
            location: location.to_string(),
        })
    }
}

/// Competitor benchmark request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorRequest {
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub location: String,
}

impl CompetitorRequest {
    /// Trim every field, drop blank competitor names, reject empty input.
    pub fn validate(&self) -> Result<CompetitorRequest> {
        let competitors: Vec<String> = self
            .competitors
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if competitors.is_empty() {
            return Err(SalarySignalError::bad_request("Missing competitors"));
        }
        let location = self.location.trim();
        if location.is_empty() {
            return Err(SalarySignalError::bad_request("Missing location"));
        }
        Ok(CompetitorRequest {
            competitors,
            location: location.to_string(),
        })
    }
}
