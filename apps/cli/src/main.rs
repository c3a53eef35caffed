//! SalarySignal CLI: verified salary benchmarks from public job postings.
//!
//! Runs the benchmark pipeline from the command line, or serves it over
//! HTTP with `salarysignal serve`.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
