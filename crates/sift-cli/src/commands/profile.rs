//! Profile-only command

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{
    load_file, profile,
    report::{format_money, missing_table, stats_table},
    AnalyzerConfig, Summary,
};

/// Print the summary statistics of a statement without charts or LLM calls
pub fn cmd_profile(config: AnalyzerConfig, file: &Path, json: bool) -> Result<()> {
    let options = config.loader_options().context("Invalid input settings")?;
    let table =
        load_file(file, &options).with_context(|| format!("Failed to profile {}", file.display()))?;
    let summary = profile(&table);

    println!(
        "{}",
        render_profile(file, &summary, &config.report.currency_symbol, json)?
    );
    Ok(())
}

/// Render a summary as text or pretty JSON
pub fn render_profile(file: &Path, summary: &Summary, currency: &str, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(summary).context("Failed to serialize summary");
    }

    let mut out = format!("📊 {}\n", file.display());
    out.push_str(&format!("   Transactions: {}\n", summary.row_count));
    if let (Some(start), Some(end)) = (summary.start_date, summary.end_date) {
        out.push_str(&format!("   Period: {} to {}\n", start, end));
    }
    out.push_str(&format!(
        "   Money out: {}\n",
        format_money(currency, summary.total_debit)
    ));
    out.push_str(&format!(
        "   Money in:  {}\n",
        format_money(currency, summary.total_credit)
    ));
    if summary.skipped_rows > 0 {
        out.push_str(&format!("   Skipped rows: {}\n", summary.skipped_rows));
    }

    out.push_str("\nMissing values\n\n");
    out.push_str(&missing_table(summary));
    out.push_str("\nSummary statistics\n\n");
    out.push_str(&stats_table(summary));
    Ok(out)
}
