//! Effective configuration dump

use anyhow::{Context, Result};
use sift_core::{config::default_config_path, AnalyzerConfig};

/// Print the merged configuration as TOML
pub fn cmd_config(config: &AnalyzerConfig) -> Result<()> {
    if let Some(path) = default_config_path() {
        let state = if path.exists() { "found" } else { "not present" };
        println!("# User config: {} ({})", path.display(), state);
    }
    println!("{}", render_config(config)?);
    Ok(())
}

pub fn render_config(config: &AnalyzerConfig) -> Result<String> {
    config.to_toml().context("Failed to serialize configuration")
}
