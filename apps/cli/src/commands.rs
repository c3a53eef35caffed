//! CLI command definitions, routing, and tracing setup.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use salarysignal_core::{ProgressReporter, SalaryPipeline};
use salarysignal_llm::provider_from_config;
use salarysignal_search::SerperClient;
use salarysignal_shared::{
    AppConfig, Benchmark, CompetitorRequest, ExtractionMode, PipelineConfig, QueryTier,
    RelevancePolicy, RoleRequest, SalarySignalError, init_config, load_config,
};

use crate::server;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SalarySignal: verified salary ranges from public job postings.
#[derive(Parser)]
#[command(
    name = "salarysignal",
    version,
    about = "Benchmark salaries from public job postings, keeping only figures found verbatim in the source.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Relevance policy flag.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum RelevanceArg {
    AllTokens,
    AnyToken,
}

/// Extraction mode flag.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ExtractionArg {
    PatternFirst,
    Corroborate,
    LlmOnly,
}

/// Pipeline overrides shared by the benchmark commands.
#[derive(clap::Args, Clone, Debug, Default)]
pub(crate) struct PipelineArgs {
    /// Monthly installments assumed when a posting names none (12 to 14).
    #[arg(long, value_parser = clap::value_parser!(u32).range(12..=14))]
    pub mensilita: Option<u32>,

    /// How strictly hits must match the role or company.
    #[arg(long, value_enum)]
    pub relevance: Option<RelevanceArg>,

    /// How the pattern and LLM strategies are combined.
    #[arg(long, value_enum)]
    pub extraction: Option<ExtractionArg>,

    /// Overall request budget in milliseconds.
    #[arg(long)]
    pub budget_ms: Option<u64>,

    /// Do not fall back to salary-report sites when job postings give nothing.
    #[arg(long)]
    pub no_reports: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Benchmark a single role in a location.
    Salary {
        /// Role to benchmark, e.g. "Data Analyst".
        role: String,

        /// Location, e.g. "Milano".
        #[arg(short, long)]
        location: String,

        /// Print the JSON payload instead of a summary.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Benchmark competitors in a location.
    Competitors {
        /// Competitor names (at most the configured maximum are queried).
        #[arg(required = true)]
        competitors: Vec<String>,

        /// Location, e.g. "Milano".
        #[arg(short, long)]
        location: String,

        /// Print the JSON payload instead of a table.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Serve the benchmark API over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "salarysignal=info",
        1 => "salarysignal=debug",
        _ => "salarysignal=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Salary {
            role,
            location,
            json,
            pipeline,
        } => cmd_salary(role, location, json, &pipeline).await,
        Command::Competitors {
            competitors,
            location,
            json,
            pipeline,
        } => cmd_competitors(competitors, location, json, &pipeline).await,
        Command::Serve {
            host,
            port,
            pipeline,
        } => cmd_serve(&host, port, &pipeline).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Pipeline construction
// ---------------------------------------------------------------------------

/// Merge config file values with CLI flags.
fn pipeline_config(config: &AppConfig, args: &PipelineArgs) -> PipelineConfig {
    let mut merged = PipelineConfig::from(config);
    if let Some(mensilita) = args.mensilita {
        merged.default_mensilita = mensilita;
    }
    if let Some(relevance) = args.relevance {
        merged.relevance = match relevance {
            RelevanceArg::AllTokens => RelevancePolicy::AllTokens,
            RelevanceArg::AnyToken => RelevancePolicy::AnyToken,
        };
    }
    if let Some(extraction) = args.extraction {
        merged.extraction = match extraction {
            ExtractionArg::PatternFirst => ExtractionMode::PatternFirst,
            ExtractionArg::Corroborate => ExtractionMode::Corroborate,
            ExtractionArg::LlmOnly => ExtractionMode::LlmOnly,
        };
    }
    if let Some(budget) = args.budget_ms {
        merged.request_budget_ms = budget;
    }
    if args.no_reports {
        merged.report_fallback = false;
    }
    merged
}

/// Wire the configured providers into a pipeline.
///
/// The search key is required. A missing LLM key only disables the LLM
/// strategy, which the pipeline then records as skipped.
pub(crate) fn build_pipeline(
    config: &AppConfig,
    args: &PipelineArgs,
) -> std::result::Result<SalaryPipeline, SalarySignalError> {
    let search = SerperClient::from_config(&config.search)?;

    let llm = match provider_from_config(&config.llm) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!(error = %e, "LLM extraction disabled");
            None
        }
    };

    Ok(SalaryPipeline::new(
        Arc::new(search),
        llm,
        config.llm.active().models.clone(),
        pipeline_config(config, args),
    ))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_salary(role: String, location: String, json: bool, args: &PipelineArgs) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config, args)?;
    let request = RoleRequest { role, location };

    info!(role = %request.role, location = %request.location, "benchmarking role");

    let reporter = CliProgress::new();
    let outcome = pipeline.benchmark_role(&request, &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_payload())?);
        return Ok(());
    }

    println!();
    match &report.benchmark {
        Benchmark::Verified(summary) => {
            println!("  {} ({})", request.role.trim(), request.location.trim());
            println!("  Min:     {:.0}", summary.min);
            println!("  Median:  {:.0}", summary.med);
            println!("  Max:     {:.0}", summary.max);
            println!("  Sources:");
            for source in &summary.sources {
                println!("    {source}");
            }
        }
        Benchmark::NoVerifiedSalary => {
            println!("  No verified salary found.");
        }
    }
    println!("  Request: {}", report.diagnostics.request_id);
    println!();

    Ok(())
}

async fn cmd_competitors(
    competitors: Vec<String>,
    location: String,
    json: bool,
    args: &PipelineArgs,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config, args)?;
    let request = CompetitorRequest {
        competitors,
        location,
    };

    info!(competitors = request.competitors.len(), location = %request.location, "benchmarking competitors");

    let reporter = CliProgress::new();
    let outcome = pipeline.benchmark_competitors(&request, &reporter).await;
    reporter.spinner.finish_and_clear();
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_payload())?);
        return Ok(());
    }

    println!();
    if report.items.is_empty() {
        println!("  No verified salary found.");
    }
    for item in &report.items {
        println!(
            "  {:<20} {:>8.0} – {:<8.0} {}",
            item.competitor, item.min, item.max, item.link
        );
    }
    println!();

    Ok(())
}

async fn cmd_serve(host: &str, port: u16, args: &PipelineArgs) -> Result<()> {
    let config = load_config()?;
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| eyre!("invalid address '{host}:{port}': {e}"))?;

    // A missing search key is reported per request, not at startup.
    let state = match build_pipeline(&config, args) {
        Ok(pipeline) => server::PipelineState::Ready(Arc::new(pipeline)),
        Err(e) => {
            warn!(error = %e, "pipeline unavailable, requests will fail");
            server::PipelineState::Unavailable(e.to_string())
        }
    };

    server::serve(addr, state).await?;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn search_settled(&self, tier: QueryTier, results: usize, failed: usize) {
        self.spinner
            .set_message(format!("Search ({tier}): {results} results, {failed} failed queries"));
    }

    fn done(&self, _ranges: usize) {
        self.spinner.finish_and_clear();
    }
}
