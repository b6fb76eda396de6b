//! Chart rendering
//!
//! Three bar charts are drawn with plotters into SVG strings and written
//! atomically into the plots directory:
//! - monthly transaction volume (every month in the date range, empty months as 0)
//! - transaction type distribution (descending frequency)
//! - top N categories (descending frequency, horizontal bars)
//!
//! Charts whose column is absent are skipped with an info log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ChartConfig;
use crate::error::{Error, Result};
use crate::fsutil::{ensure_dir, write_atomic};
use crate::models::{ColumnRole, TransactionTable};

/// The charts Sift knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    MonthlyVolume,
    TypeDistribution,
    TopCategories,
}

impl ChartKind {
    pub fn all() -> &'static [ChartKind] {
        &[Self::MonthlyVolume, Self::TypeDistribution, Self::TopCategories]
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::MonthlyVolume => "monthly_volume",
            Self::TypeDistribution => "type_distribution",
            Self::TopCategories => "top_categories",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.svg", self.file_stem())
    }

    /// Heading used for the chart in the report
    pub fn heading(&self) -> &'static str {
        match self {
            Self::MonthlyVolume => "Monthly Volume",
            Self::TypeDistribution => "Type Distribution",
            Self::TopCategories => "Top Categories",
        }
    }

    /// Caption drawn on the chart itself
    pub fn caption(&self) -> &'static str {
        match self {
            Self::MonthlyVolume => "Monthly Transaction Volume",
            Self::TypeDistribution => "Transaction Type Distribution",
            Self::TopCategories => "Top Categories by Transaction Count",
        }
    }

    /// Column the chart depends on, if any beyond the date
    pub fn required_role(&self) -> ColumnRole {
        match self {
            Self::MonthlyVolume => ColumnRole::Date,
            Self::TypeDistribution => ColumnRole::Type,
            Self::TopCategories => ColumnRole::Category,
        }
    }
}

/// A rendered chart and the series it was drawn from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub path: PathBuf,
    /// (label, count) in drawing order
    pub series: Vec<(String, usize)>,
}

/// Draws the chart set for a table into an output directory
pub struct ChartRenderer {
    output_dir: PathBuf,
    top_n: usize,
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, config: &ChartConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            top_n: config.top_categories,
            width: config.width,
            height: config.height,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render every chart the table supports
    pub fn render_all(&self, table: &TransactionTable) -> Result<Vec<ChartArtifact>> {
        ensure_dir(&self.output_dir)?;

        let mut artifacts = Vec::new();
        for kind in ChartKind::all() {
            match self.render(*kind, table)? {
                Some(artifact) => {
                    info!(
                        chart = kind.file_stem(),
                        path = %artifact.path.display(),
                        "Rendered chart"
                    );
                    artifacts.push(artifact);
                }
                None => self.remove_stale(*kind)?,
            }
        }
        Ok(artifacts)
    }

    /// Render one chart; `None` when the table lacks the data for it
    pub fn render(&self, kind: ChartKind, table: &TransactionTable) -> Result<Option<ChartArtifact>> {
        let role = kind.required_role();
        if !table.has(role) {
            info!(
                chart = kind.file_stem(),
                column = role.as_str(),
                "Column not present, skipping chart"
            );
            return Ok(None);
        }

        let series = match kind {
            ChartKind::MonthlyVolume => monthly_counts(table),
            ChartKind::TypeDistribution => {
                value_counts(table.transactions.iter().filter_map(|t| t.kind.as_deref()))
            }
            ChartKind::TopCategories => {
                let mut counts =
                    value_counts(table.transactions.iter().filter_map(|t| t.category.as_deref()));
                counts.truncate(self.top_n);
                counts
            }
        };

        if series.is_empty() {
            info!(
                chart = kind.file_stem(),
                column = role.as_str(),
                "Column has no values, skipping chart"
            );
            return Ok(None);
        }

        let svg = match kind {
            ChartKind::MonthlyVolume => {
                self.draw_vertical(kind.caption(), "Month", &series)?
            }
            ChartKind::TypeDistribution => {
                self.draw_vertical(kind.caption(), "Transaction Type", &series)?
            }
            ChartKind::TopCategories => self.draw_horizontal(kind.caption(), "Category", &series)?,
        };

        let path = self.output_dir.join(kind.file_name());
        write_atomic(&path, svg.as_bytes())?;

        Ok(Some(ChartArtifact { kind, path, series }))
    }

    /// Remove a chart left over from an earlier run so the directory matches this run
    fn remove_stale(&self, kind: ChartKind) -> Result<()> {
        let path = self.output_dir.join(kind.file_name());
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed stale chart");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::write(path, e)),
        }
    }

    fn draw_vertical(&self, caption: &str, x_desc: &str, series: &[(String, usize)]) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let n = series.len() as u32;
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 28))
                .margin(15)
                .x_label_area_size(60)
                .y_label_area_size(60)
                .build_cartesian_2d((0u32..n).into_segmented(), 0u32..axis_max(series))
                .map_err(chart_err)?;

            let label = |v: &SegmentValue<u32>| segment_label(v, series);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(series.len())
                .x_label_formatter(&label)
                .x_desc(x_desc)
                .y_desc("Transactions")
                .draw()
                .map_err(chart_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BLUE.mix(0.7).filled())
                        .margin(4)
                        .data(series.iter().enumerate().map(|(i, (_, c))| (i as u32, *c as u32))),
                )
                .map_err(chart_err)?;

            root.present().map_err(chart_err)?;
        }
        Ok(svg)
    }

    /// Horizontal bars, largest at the top
    fn draw_horizontal(&self, caption: &str, y_desc: &str, series: &[(String, usize)]) -> Result<String> {
        // Segment 0 sits at the bottom of the y axis
        let bottom_up: Vec<(String, usize)> = series.iter().rev().cloned().collect();

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let n = bottom_up.len() as u32;
            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 28))
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(180)
                .build_cartesian_2d(0u32..axis_max(&bottom_up), (0u32..n).into_segmented())
                .map_err(chart_err)?;

            let label = |v: &SegmentValue<u32>| segment_label(v, &bottom_up);
            chart
                .configure_mesh()
                .disable_y_mesh()
                .y_labels(bottom_up.len())
                .y_label_formatter(&label)
                .x_desc("Transactions")
                .y_desc(y_desc)
                .draw()
                .map_err(chart_err)?;

            chart
                .draw_series(
                    Histogram::horizontal(&chart)
                        .style(GREEN.mix(0.7).filled())
                        .margin(4)
                        .data(bottom_up.iter().enumerate().map(|(i, (_, c))| (i as u32, *c as u32))),
                )
                .map_err(chart_err)?;

            root.present().map_err(chart_err)?;
        }
        Ok(svg)
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

fn segment_label(value: &SegmentValue<u32>, series: &[(String, usize)]) -> String {
    match value {
        SegmentValue::CenterOf(i) => series
            .get(*i as usize)
            .map(|(label, _)| label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Count axis upper bound with ~10% headroom
fn axis_max(series: &[(String, usize)]) -> u32 {
    let max = series.iter().map(|(_, c)| *c).max().unwrap_or(0) as u32;
    max + (max / 10).max(1)
}

/// Rows per calendar month, chronological, with empty months in range as 0
pub fn monthly_counts(table: &TransactionTable) -> Vec<(String, usize)> {
    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for tx in &table.transactions {
        *buckets.entry(month_key(tx.date)).or_insert(0) += 1;
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let (mut year, mut month) = first;
    while (year, month) <= last {
        let count = buckets.get(&(year, month)).copied().unwrap_or(0);
        series.push((format!("{:04}-{:02}", year, month), count));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    series
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Occurrences per distinct value (case-sensitive), by descending count then label
pub fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut series: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    // BTreeMap order already sorts labels; a stable sort keeps it for ties
    series.sort_by(|a, b| b.1.cmp(&a.1));
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_reader, LoaderOptions};
    use tempfile::TempDir;

    const FULL: &str = "Transaction Date,Transaction Type,Debit Amount,Credit Amount,Balance,Category
30/01/2025,DEB,10.00,,990.00,Groceries
02/01/2025,DEB,3.50,,986.50,Eating Out
15/03/2025,FPI,,2000.00,2986.50,Income
20/03/2025,DD,45.00,,2941.50,Bills
21/03/2025,DEB,21.50,,2920.00,Groceries";

    fn load(csv: &str) -> TransactionTable {
        load_reader(csv.as_bytes(), &LoaderOptions::default()).unwrap()
    }

    fn renderer(dir: &Path) -> ChartRenderer {
        ChartRenderer::new(dir, &ChartConfig::default())
    }

    #[test]
    fn test_monthly_counts_fill_empty_months() {
        let series = monthly_counts(&load(FULL));
        assert_eq!(
            series,
            vec![
                ("2025-01".to_string(), 2),
                ("2025-02".to_string(), 0),
                ("2025-03".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_monthly_counts_cross_year() {
        let table = load("Date,Amount\n2024-12-31,-1\n2025-01-01,-1\n");
        let labels: Vec<_> = monthly_counts(&table).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["2024-12", "2025-01"]);
    }

    #[test]
    fn test_value_counts_descending_with_label_ties() {
        let values = ["DEB", "FPI", "DEB", "DD", "deb", "FPI", "DEB"];
        let counts = value_counts(values.into_iter());
        assert_eq!(
            counts,
            vec![
                ("DEB".to_string(), 3),
                ("FPI".to_string(), 2),
                ("DD".to_string(), 1),
                ("deb".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_render_all_writes_three_svgs() {
        let dir = TempDir::new().unwrap();
        let artifacts = renderer(dir.path()).render_all(&load(FULL)).unwrap();

        let kinds: Vec<_> = artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ChartKind::all());
        for artifact in &artifacts {
            let svg = std::fs::read_to_string(&artifact.path).unwrap();
            assert!(svg.contains("<svg"));
        }
        assert_eq!(artifacts[1].series[0], ("DEB".to_string(), 3));
    }

    #[test]
    fn test_missing_category_skips_top_categories() {
        let dir = TempDir::new().unwrap();
        let table = load("Date,Type,Amount\n2025-01-02,DEB,-4.00\n2025-01-03,FPI,10.00\n");
        let artifacts = renderer(dir.path()).render_all(&table).unwrap();

        let kinds: Vec<_> = artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, [ChartKind::MonthlyVolume, ChartKind::TypeDistribution]);
        assert!(!dir.path().join("top_categories.svg").exists());
    }

    #[test]
    fn test_stale_chart_removed_when_column_absent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("top_categories.svg"), "<svg/>").unwrap();

        let table = load("Date,Amount\n2025-01-02,-4.00\n");
        renderer(dir.path()).render_all(&table).unwrap();
        assert!(!dir.path().join("top_categories.svg").exists());
    }

    #[test]
    fn test_top_categories_truncated() {
        let mut csv = String::from("Date,Amount,Category\n");
        for i in 0..15 {
            for _ in 0..=i {
                csv.push_str(&format!("2025-01-02,-1.00,Cat{:02}\n", i));
            }
        }

        let dir = TempDir::new().unwrap();
        let config = ChartConfig {
            top_categories: 4,
            ..ChartConfig::default()
        };
        let artifact = ChartRenderer::new(dir.path(), &config)
            .render(ChartKind::TopCategories, &load(&csv))
            .unwrap()
            .unwrap();

        let labels: Vec<_> = artifact.series.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["Cat14", "Cat13", "Cat12", "Cat11"]);
    }

    #[test]
    fn test_all_blank_type_column_skips_chart() {
        let dir = TempDir::new().unwrap();
        let table = load("Date,Type,Amount\n2025-01-02,,-4.00\n");
        let artifact = renderer(dir.path())
            .render(ChartKind::TypeDistribution, &table)
            .unwrap();
        assert!(artifact.is_none());
    }

    #[test]
    fn test_unwritable_output_dir_is_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("plots");
        std::fs::write(&blocker, "file, not dir").unwrap();

        let err = renderer(&blocker).render_all(&load(FULL)).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
