//! Command implementations for the sift CLI
//!
//! Each submodule handles one command. `apply_*` helpers fold CLI flags onto
//! the configuration loaded from file and environment.

mod analyze;
mod config;
mod llm;
mod profile;

pub use analyze::*;
pub use config::*;
pub use llm::*;
pub use profile::*;

use sift_core::{config::normalize_host, AnalyzerConfig};

use crate::cli::{AnalyzeArgs, InputArgs};

/// Report file name used when only `--out-dir` is given
pub const REPORT_FILE_NAME: &str = "analysis_report.md";

/// Apply input-format flags
pub fn apply_input_args(config: &mut AnalyzerConfig, input: &InputArgs) {
    if input.decimal_comma {
        config.input.decimal_separator = ',';
        config.input.thousands_separator = Some('.');
        config.input.delimiter = ';';
    }
    if let Some(delimiter) = input.delimiter {
        config.input.delimiter = delimiter;
    }
}

/// Apply host/model flags shared by `analyze` and `check-llm`
pub fn apply_llm_overrides(config: &mut AnalyzerConfig, host: Option<&str>, model: Option<&str>) {
    if let Some(host) = host {
        config.llm.host = normalize_host(host);
    }
    if let Some(model) = model {
        config.llm.model = model.to_string();
    }
}

/// Apply every flag of a full analysis run
pub fn apply_analyze_args(config: &mut AnalyzerConfig, args: &AnalyzeArgs) {
    apply_input_args(config, &args.input);
    apply_llm_overrides(config, args.host.as_deref(), args.model.as_deref());

    if let Some(dir) = &args.out_dir {
        config.output.plots_dir = dir.join("plots");
        config.output.report_path = dir.join(REPORT_FILE_NAME);
    }
    if let Some(report) = &args.report {
        config.output.report_path = report.clone();
    }
    if let Some(model) = &args.review_model {
        config.llm.review_model = model.clone();
    }
    if args.no_review {
        config.llm.expert_review = false;
    }
    if let Some(secs) = args.timeout {
        config.llm.timeout_secs = secs;
    }
}
