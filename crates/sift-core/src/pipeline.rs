//! The analysis run: load → profile → charts → insights → report
//!
//! Stages run strictly in sequence. Load, chart and report failures abort the
//! run; an unavailable LLM does not.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::charts::{ChartArtifact, ChartRenderer};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::insights::{InsightGenerator, Insights};
use crate::loader::load_file;
use crate::models::TransactionTable;
use crate::profile::{profile, Summary};
use crate::report::ReportAssembler;

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report_path: PathBuf,
    pub summary: Summary,
    pub charts: Vec<ChartArtifact>,
    pub insights: Insights,
}

impl RunOutcome {
    /// Whether the first-pass commentary came back from the model
    pub fn insights_available(&self) -> bool {
        self.insights.commentary.is_generated()
    }
}

/// Runs the full pipeline for one input file
pub struct Analyzer {
    config: AnalyzerConfig,
    generator: InsightGenerator,
}

impl Analyzer {
    /// Build an analyzer with the LLM client described by the config
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let generator = InsightGenerator::from_config(&config)?;
        Ok(Self { config, generator })
    }

    /// Build an analyzer around an existing insight generator
    pub fn with_generator(config: AnalyzerConfig, generator: InsightGenerator) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Load and profile a file without rendering or calling the LLM
    pub fn profile(&self, input: &Path) -> Result<(TransactionTable, Summary)> {
        let table = load_file(input, &self.config.loader_options()?)?;
        let summary = profile(&table);
        Ok((table, summary))
    }

    pub async fn run(&self, input: &Path) -> Result<RunOutcome> {
        info!(input = %input.display(), "Starting analysis");

        let (table, summary) = self.profile(input)?;
        info!(
            rows = summary.row_count,
            numeric_columns = summary.stats.len(),
            "Profiled transactions"
        );

        let renderer = ChartRenderer::new(&self.config.output.plots_dir, &self.config.charts);
        let charts = renderer.render_all(&table)?;

        let insights = self.generator.generate(&table, &summary).await?;

        let assembler = ReportAssembler::new(&self.config.output.report_path, &self.config.report);
        let report_path = assembler.write(&summary, &charts, &insights)?;

        info!(
            report = %report_path.display(),
            charts = charts.len(),
            insights = insights.commentary.is_generated(),
            "Analysis complete"
        );

        Ok(RunOutcome {
            report_path,
            summary,
            charts,
            insights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::{LlmClient, MockBackend};
    use crate::prompts::PromptLibrary;
    use tempfile::TempDir;

    const CSV: &str = "Transaction Date,Transaction Type,Debit Amount,Credit Amount,Balance,Category
02/01/2025,DEB,10.00,,990.00,Groceries
03/02/2025,FPI,,2000.00,2990.00,Income
04/03/2025,DEB,3.50,,2986.50,Eating Out
";

    fn setup(dir: &Path, mock: MockBackend) -> (Analyzer, PathBuf) {
        let input = dir.join("transactions.csv");
        std::fs::write(&input, CSV).unwrap();

        let mut config = AnalyzerConfig::default();
        config.output.plots_dir = dir.join("out").join("plots");
        config.output.report_path = dir.join("out").join("analysis_report.md");

        let generator =
            InsightGenerator::new(LlmClient::Mock(mock), PromptLibrary::embedded().unwrap());
        (Analyzer::with_generator(config, generator), input)
    }

    #[tokio::test]
    async fn test_run_writes_report_and_charts() {
        let dir = TempDir::new().unwrap();
        let (analyzer, input) = setup(dir.path(), MockBackend::with_response("All good."));

        let outcome = analyzer.run(&input).await.unwrap();
        assert!(outcome.insights_available());
        assert_eq!(outcome.summary.row_count, 3);
        assert_eq!(outcome.charts.len(), 3);

        let report = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.contains("All good."));
        assert!(report.contains("![top_categories](plots/top_categories.svg)"));
    }

    #[tokio::test]
    async fn test_run_survives_unavailable_llm() {
        let dir = TempDir::new().unwrap();
        let (analyzer, input) = setup(dir.path(), MockBackend::unavailable());

        let outcome = analyzer.run(&input).await.unwrap();
        assert!(!outcome.insights_available());
        let report = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.contains(crate::report::UNAVAILABLE_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_missing_input_is_load_error() {
        let dir = TempDir::new().unwrap();
        let (analyzer, _) = setup(dir.path(), MockBackend::new());

        let err = analyzer.run(&dir.path().join("nope.csv")).await.unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert!(!dir.path().join("out").join("analysis_report.md").exists());
    }
}
