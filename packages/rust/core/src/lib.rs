//! Core pipeline orchestration and domain logic for SalarySignal.
//!
//! This crate ties together query synthesis, search fan-out, candidate
//! filtering, extraction and validation into the two end-to-end benchmarks
//! ([`SalaryPipeline::benchmark_role`] and
//! [`SalaryPipeline::benchmark_competitors`]).

pub mod candidates;
pub mod cascade;
pub mod llm_extract;
pub mod pipeline;
pub mod query;
pub mod sources;
pub mod summary;

pub use pipeline::{
    CompetitorReport, ProgressReporter, RoleReport, SalaryPipeline, SilentProgress,
};
pub use summary::{CompetitorAggregate, summarize, summarize_by_competitor};
