//! Sift CLI - Bank statement analyzer
//!
//! Usage:
//!   sift [FILE]                  Analyze FILE (default: transactions.csv)
//!   sift profile FILE --json     Print the summary statistics only
//!   sift check-llm               Check the Ollama endpoint
//!   sift config                  Print the effective configuration

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use sift_core::AnalyzerConfig;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let mut config =
        AnalyzerConfig::from_env(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(
        backend = config.llm.backend.as_str(),
        host = %config.llm.host,
        model = %config.llm.model,
        "Configuration loaded"
    );

    match cli.command {
        None => {
            commands::apply_analyze_args(&mut config, &cli.analyze);
            commands::cmd_analyze(config, &cli.analyze.file).await?;
            Ok(())
        }
        Some(Commands::Profile { file, input, json }) => {
            commands::apply_input_args(&mut config, &input);
            commands::cmd_profile(config, &file, json)
        }
        Some(Commands::CheckLlm { host, model }) => {
            commands::apply_llm_overrides(&mut config, host.as_deref(), model.as_deref());
            if !commands::cmd_check_llm(&config).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Config) => commands::cmd_config(&config),
    }
}
