//! Application configuration for SalarySignal.
//!
//! User config lives at `~/.salarysignal/salarysignal.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the file, only the name of the
//! environment variable that holds them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalarySignalError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "salarysignal.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".salarysignal";

// ---------------------------------------------------------------------------
// Config structs (matching salarysignal.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Serper-compatible search endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Organic results requested per query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,

    /// Per-call timeout.
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,

    /// Country hint (`gl`).
    #[serde(default = "default_locale")]
    pub country: String,

    /// Interface language hint (`hl`).
    #[serde(default = "default_locale")]
    pub language: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            results_per_query: default_results_per_query(),
            timeout_ms: default_search_timeout_ms(),
            country: default_locale(),
            language: default_locale(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_results_per_query() -> u32 {
    10
}
fn default_search_timeout_ms() -> u64 {
    6_000
}
fn default_locale() -> String {
    "it".into()
}

/// Which LLM backend performs structured extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    Perplexity,
}

/// One rung of the model ladder: a model and the time it is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStage {
    pub name: String,
    pub timeout_ms: u64,
}

impl ModelStage {
    pub fn new(name: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            timeout_ms,
        }
    }
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend used for structured extraction.
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// Gemini settings.
    #[serde(default = "default_gemini")]
    pub gemini: ProviderConfig,

    /// Perplexity settings.
    #[serde(default = "default_perplexity")]
    pub perplexity: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            gemini: default_gemini(),
            perplexity: default_perplexity(),
        }
    }
}

impl LlmConfig {
    /// Settings of the active provider.
    pub fn active(&self) -> &ProviderConfig {
        match self.provider {
            LlmProviderKind::Gemini => &self.gemini,
            LlmProviderKind::Perplexity => &self.perplexity,
        }
    }
}

/// `[llm.gemini]` / `[llm.perplexity]` sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL.
    pub endpoint: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    /// Model ladder, most capable first. A timeout moves down one rung.
    pub models: Vec<ModelStage>,
}

fn default_gemini() -> ProviderConfig {
    ProviderConfig {
        endpoint: "https://generativelanguage.googleapis.com".into(),
        api_key_env: "GEMINI_API_KEY".into(),
        models: vec![ModelStage::new("gemini-2.5-flash", 12_000)],
    }
}

fn default_perplexity() -> ProviderConfig {
    ProviderConfig {
        endpoint: "https://api.perplexity.ai".into(),
        api_key_env: "PERPLEXITY_API_KEY".into(),
        models: vec![
            ModelStage::new("sonar-deep-research", 6_000),
            ModelStage::new("sonar", 3_000),
        ],
    }
}

/// Token-matching policy for candidate relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelevancePolicy {
    /// Every significant token must appear.
    #[default]
    AllTokens,
    /// At least one significant token must appear.
    AnyToken,
}

/// How the two extraction strategies are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Deterministic patterns; LLM only when they validate nothing.
    #[default]
    PatternFirst,
    /// Both strategies always run; results are merged per URL.
    Corroborate,
    /// LLM only.
    LlmOnly,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Monthly installments assumed when the text names none.
    #[serde(default = "default_mensilita")]
    pub default_mensilita: u32,

    /// Corpus cap for the single-role variant.
    #[serde(default = "default_role_corpus_cap")]
    pub role_corpus_cap: usize,

    /// Corpus cap for the competitor variant.
    #[serde(default = "default_competitor_corpus_cap")]
    pub competitor_corpus_cap: usize,

    /// Competitors queried per request; extra names are ignored.
    #[serde(default = "default_max_competitors")]
    pub max_competitors: usize,

    /// Lowest plausible annual salary (upper bound below this is rejected).
    #[serde(default = "default_salary_floor")]
    pub salary_floor: f64,

    /// Highest plausible annual salary.
    #[serde(default = "default_salary_ceiling")]
    pub salary_ceiling: f64,

    #[serde(default)]
    pub relevance: RelevancePolicy,

    #[serde(default)]
    pub extraction: ExtractionMode,

    /// Overall per-request budget.
    #[serde(default = "default_request_budget_ms")]
    pub request_budget_ms: u64,

    /// Salary keywords OR-ed into strict queries.
    #[serde(default = "default_salary_keywords")]
    pub salary_keywords: Vec<String>,

    /// Search salary-report sites when job postings yield no verified range
    /// (single-role variant).
    #[serde(default = "default_report_fallback")]
    pub report_fallback: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_mensilita: default_mensilita(),
            role_corpus_cap: default_role_corpus_cap(),
            competitor_corpus_cap: default_competitor_corpus_cap(),
            max_competitors: default_max_competitors(),
            salary_floor: default_salary_floor(),
            salary_ceiling: default_salary_ceiling(),
            relevance: RelevancePolicy::default(),
            extraction: ExtractionMode::default(),
            request_budget_ms: default_request_budget_ms(),
            salary_keywords: default_salary_keywords(),
            report_fallback: default_report_fallback(),
        }
    }
}

fn default_mensilita() -> u32 {
    13
}
fn default_role_corpus_cap() -> usize {
    30
}
fn default_competitor_corpus_cap() -> usize {
    40
}
fn default_max_competitors() -> usize {
    6
}
fn default_salary_floor() -> f64 {
    15_000.0
}
fn default_salary_ceiling() -> f64 {
    300_000.0
}
fn default_request_budget_ms() -> u64 {
    30_000
}
fn default_report_fallback() -> bool {
    true
}
fn default_salary_keywords() -> Vec<String> {
    ["RAL", "retribuzione", "stipendio", "annua", "lordo", "€", "EUR"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Organic results requested per query.
    pub results_per_query: u32,
    /// Per-call search timeout in ms.
    pub search_timeout_ms: u64,
    /// Monthly installments assumed when the text names none.
    pub default_mensilita: u32,
    /// Corpus cap for the single-role variant.
    pub role_corpus_cap: usize,
    /// Corpus cap for the competitor variant.
    pub competitor_corpus_cap: usize,
    /// Competitors queried per request.
    pub max_competitors: usize,
    /// Plausibility floor for the annual upper bound.
    pub salary_floor: f64,
    /// Plausibility ceiling for the annual upper bound.
    pub salary_ceiling: f64,
    /// Relevance token policy.
    pub relevance: RelevancePolicy,
    /// Strategy combination.
    pub extraction: ExtractionMode,
    /// Overall per-request budget in ms.
    pub request_budget_ms: u64,
    /// Salary keywords for strict queries.
    pub salary_keywords: Vec<String>,
    /// Fall back to salary-report sites for a single role.
    pub report_fallback: bool,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        let p = &config.pipeline;
        Self {
            results_per_query: config.search.results_per_query,
            search_timeout_ms: config.search.timeout_ms,
            default_mensilita: p.default_mensilita,
            role_corpus_cap: p.role_corpus_cap,
            competitor_corpus_cap: p.competitor_corpus_cap,
            max_competitors: p.max_competitors,
            salary_floor: p.salary_floor,
            salary_ceiling: p.salary_ceiling,
            relevance: p.relevance,
            extraction: p.extraction,
            request_budget_ms: p.request_budget_ms,
            salary_keywords: p.salary_keywords.clone(),
            report_fallback: p.report_fallback,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.salarysignal/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SalarySignalError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.salarysignal/salarysignal.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SalarySignalError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SalarySignalError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SalarySignalError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SalarySignalError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SalarySignalError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a credential from the named env var. Missing or empty is a config
/// error, reported before any network call is made.
pub fn resolve_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(SalarySignalError::config(format!("Missing {var_name}"))),
    }
}
