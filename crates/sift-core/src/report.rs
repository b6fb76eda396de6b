//! Markdown report assembly
//!
//! Section order: title and timestamp, data structure analysis (key figures,
//! missing values, summary statistics), visualizations, LLM insights and the
//! expert review. Sections with nothing to show are left out entirely, except
//! LLM insights, which falls back to a placeholder when the endpoint failed.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::charts::ChartArtifact;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::fsutil::write_atomic;
use crate::insights::{Commentary, Insights};
use crate::profile::Summary;

/// Opening words of the placeholder that replaces unavailable commentary
pub const UNAVAILABLE_PLACEHOLDER: &str = "LLM insights unavailable";

/// Writes the Markdown report
pub struct ReportAssembler {
    report_path: PathBuf,
    title: String,
    currency_symbol: String,
}

impl ReportAssembler {
    pub fn new(report_path: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            report_path: report_path.into(),
            title: config.title.clone(),
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Render the report and write it atomically to the report path
    pub fn write(
        &self,
        summary: &Summary,
        charts: &[ChartArtifact],
        insights: &Insights,
    ) -> Result<PathBuf> {
        let content = self.render(summary, charts, insights, Local::now().naive_local());
        write_atomic(&self.report_path, content.as_bytes())?;
        info!(path = %self.report_path.display(), "Report written");
        Ok(self.report_path.clone())
    }

    /// Render the report as Markdown
    pub fn render(
        &self,
        summary: &Summary,
        charts: &[ChartArtifact],
        insights: &Insights,
        generated_at: NaiveDateTime,
    ) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "Generated on: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"));

        out.push_str("## Data Structure Analysis\n\n");
        let _ = writeln!(out, "- **Number of transactions:** {}", summary.row_count);
        let _ = writeln!(
            out,
            "- **Time period:** {} to {}",
            fmt_date(summary.start_date),
            fmt_date(summary.end_date)
        );
        let _ = writeln!(
            out,
            "- **Total money out:** {}",
            format_money(&self.currency_symbol, summary.total_debit)
        );
        let _ = writeln!(
            out,
            "- **Total money in:** {}",
            format_money(&self.currency_symbol, summary.total_credit)
        );
        if summary.skipped_rows > 0 {
            let _ = writeln!(
                out,
                "- **Rows skipped (unparseable date):** {}",
                summary.skipped_rows
            );
        }

        out.push_str("\n### Missing Values\n\n");
        out.push_str(&missing_table(summary));
        out.push_str("\n\n### Summary Statistics\n\n");
        out.push_str(&stats_table(summary));
        out.push_str("\n\n");

        if !charts.is_empty() {
            out.push_str("## Visualizations\n\n");
            let base = self.report_path.parent().unwrap_or(Path::new(""));
            for chart in charts {
                let _ = writeln!(
                    out,
                    "### {}\n\n![{}]({})\n",
                    chart.kind.heading(),
                    chart.kind.file_stem(),
                    markdown_path(&relative_to(&chart.path, base))
                );
            }
        }

        out.push_str("## LLM Insights\n\n");
        out.push_str(&section_body(&insights.commentary));
        out.push_str("\n\n");

        if let Some(review) = &insights.review {
            out.push_str("## Expert Review\n\n");
            out.push_str(&section_body(review));
            out.push_str("\n\n");
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}

fn section_body(commentary: &Commentary) -> String {
    match commentary {
        Commentary::Generated(text) => text.trim().to_string(),
        Commentary::Unavailable { reason } => format!(
            "> _{}: {}._\n>\n> The rest of this report was produced without model commentary.",
            UNAVAILABLE_PLACEHOLDER,
            reason.trim_end_matches('.')
        ),
    }
}

/// Thousands-grouped amount with two decimals and a currency symbol
pub fn format_money(symbol: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}{}", symbol, format_num::format_num!(",.2", -amount))
    } else {
        format!("{}{}", symbol, format_num::format_num!(",.2", amount))
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn fmt_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Make a value safe inside a Markdown table cell
pub fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Missing-value counts as a Markdown table
pub fn missing_table(summary: &Summary) -> String {
    let mut out = String::from("| Column | Missing |\n| --- | ---: |");
    for m in &summary.missing {
        let _ = write!(out, "\n| {} | {} |", escape_cell(&m.column), m.missing);
    }
    out
}

/// Per-column summary statistics as a Markdown table
pub fn stats_table(summary: &Summary) -> String {
    if summary.stats.is_empty() {
        return "_No numeric columns._".to_string();
    }

    let mut out = String::from(
        "| Column | Count | Mean | Std | Min | 25% | 50% | 75% | Max |\n\
         | --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |",
    );
    for s in &summary.stats {
        let _ = write!(
            out,
            "\n| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&s.column),
            s.count,
            fmt_stat(s.mean),
            fmt_stat(s.std),
            fmt_stat(s.min),
            fmt_stat(s.q25),
            fmt_stat(s.median),
            fmt_stat(s.q75),
            fmt_stat(s.max),
        );
    }
    out
}

/// `path` expressed relative to `base`
///
/// Both must be absolute or both relative; otherwise `path` is returned unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() != base.is_absolute() {
        return path.to_path_buf();
    }

    let path_parts: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let base_parts: Vec<Component> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    // Can't climb out of a directory we don't know the name of
    if base_parts[common..]
        .iter()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return path.to_path_buf();
    }

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Forward-slash path for Markdown links
fn markdown_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
