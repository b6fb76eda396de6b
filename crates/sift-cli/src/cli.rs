//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Sift - Analyze a bank statement CSV into a Markdown report
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(about = "Bank statement analyzer with local LLM commentary", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.config/sift/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments for a full analysis run (the default command)
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Statement CSV to analyze
    #[arg(default_value = "transactions.csv")]
    pub file: PathBuf,

    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory: report at DIR/analysis_report.md, charts in DIR/plots
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Report path (overrides the one implied by --out-dir)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Model used for the insights
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model used for the expert review
    #[arg(long)]
    pub review_model: Option<String>,

    /// Skip the expert review pass
    #[arg(long)]
    pub no_review: bool,

    /// Ollama host (e.g. http://localhost:11434)
    #[arg(long)]
    pub host: Option<String>,

    /// LLM request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// How to read the CSV
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Field delimiter (single ASCII character)
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Amounts use a decimal comma and '.' thousands (implies ';' delimiter unless --delimiter is given)
    #[arg(long)]
    pub decimal_comma: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and profile a file without drawing charts or calling the LLM
    Profile {
        /// Statement CSV to profile
        file: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the LLM endpoint is reachable
    CheckLlm {
        /// Ollama host (e.g. http://localhost:11434)
        #[arg(long)]
        host: Option<String>,

        /// Model to report
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the effective configuration (file + environment) as TOML
    Config,
}
