//! Full analysis run

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{Analyzer, AnalyzerConfig, RunOutcome};

/// Load, profile, chart, ask the LLM and write the report
pub async fn cmd_analyze(config: AnalyzerConfig, file: &Path) -> Result<RunOutcome> {
    let analyzer = Analyzer::new(config).context("Failed to set up analyzer")?;
    let outcome = analyzer
        .run(file)
        .await
        .with_context(|| format!("Analysis of {} failed", file.display()))?;

    let summary = &outcome.summary;
    println!("✅ Report written to {}", outcome.report_path.display());
    println!("   Transactions: {}", summary.row_count);
    if let (Some(start), Some(end)) = (summary.start_date, summary.end_date) {
        println!("   Period: {} to {}", start, end);
    }
    if summary.skipped_rows > 0 {
        println!("   Skipped rows (unparseable date): {}", summary.skipped_rows);
    }
    println!("   Charts: {}", outcome.charts.len());
    for chart in &outcome.charts {
        println!("     - {}", chart.path.display());
    }

    if !outcome.insights_available() {
        println!();
        println!("⚠️  LLM insights unavailable; the report contains a placeholder.");
        println!("   Run 'sift check-llm' to diagnose the endpoint.");
    }

    Ok(outcome)
}
