//! Shared types, error model, and configuration for SalarySignal.
//!
//! This crate is the foundation depended on by all other SalarySignal crates.
//! It provides:
//! - [`SalarySignalError`]: the unified error type
//! - Domain types ([`CandidateEntry`], [`ExtractedRange`], [`ValidatedRange`], [`Benchmark`])
//! - Per-request [`Diagnostics`]
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractionMode, LlmConfig, LlmProviderKind, ModelStage, PipelineConfig,
    PipelineSettings, ProviderConfig, RelevancePolicy, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use error::{Result, SalarySignalError};
pub use types::{
    Benchmark, BenchmarkSummary, CandidateEntry, CompetitorRange, CompetitorRequest,
    ExtractedRange, ExtractionStrategy, NO_VERIFIED_SALARY, Period, QueryTier, RawResult,
    RoleRequest, SearchQuery, ValidatedRange,
};
