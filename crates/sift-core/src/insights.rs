//! Insight generation
//!
//! Builds a deterministic prompt from a sample of the statement and its
//! summary figures, sends it to the configured LLM backend and keeps the
//! response verbatim. An optional second call asks a review model to
//! critique the first response.
//!
//! Endpoint failures never abort the run: they become
//! `Commentary::Unavailable` and the report carries a placeholder.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::llm::{LlmBackend, LlmClient};
use crate::models::{ColumnRole, Transaction, TransactionTable};
use crate::profile::Summary;
use crate::prompts::{PromptId, PromptLibrary};
use crate::report::{escape_cell, format_money, stats_table};

/// Outcome of one LLM call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commentary {
    /// Response text, verbatim
    Generated(String),
    /// The endpoint was unreachable, errored or timed out
    Unavailable { reason: String },
}

impl Commentary {
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated(text) => Some(text),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Commentary for the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    pub commentary: Commentary,
    /// Present only when a review was requested and the first call succeeded
    pub review: Option<Commentary>,
}

/// Prompts the LLM for commentary on a statement
pub struct InsightGenerator {
    client: LlmClient,
    review_client: Option<LlmClient>,
    prompts: PromptLibrary,
    sample_rows: usize,
    currency_symbol: String,
}

impl InsightGenerator {
    /// Generator without an expert review pass
    pub fn new(client: LlmClient, prompts: PromptLibrary) -> Self {
        Self {
            client,
            review_client: None,
            prompts,
            sample_rows: 5,
            currency_symbol: "£".to_string(),
        }
    }

    /// Build the generator (and review client, if enabled) from config
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let client = LlmClient::from_config(&config.llm)?;
        let prompts = PromptLibrary::load(config.prompts.override_dir.as_deref())?;

        let mut generator = Self::new(client, prompts)
            .with_sample_rows(config.llm.sample_rows)
            .with_currency_symbol(&config.report.currency_symbol);
        if config.llm.expert_review {
            let review = generator.client.with_model(&config.llm.review_model);
            generator = generator.with_review(review);
        }
        Ok(generator)
    }

    pub fn with_review(mut self, review_client: LlmClient) -> Self {
        self.review_client = Some(review_client);
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: &str) -> Self {
        self.currency_symbol = symbol.to_string();
        self
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    pub fn review_client(&self) -> Option<&LlmClient> {
        self.review_client.as_ref()
    }

    /// The first-pass prompt for a statement
    pub fn insight_prompt(&self, table: &TransactionTable, summary: &Summary) -> Result<String> {
        let mut vars = self.key_figures(summary);
        let sample_size = self.sample_rows.min(table.len()).to_string();
        let sample = sample_table(table, self.sample_rows);
        let stats = if summary.stats.is_empty() {
            String::new()
        } else {
            stats_table(summary)
        };
        vars.insert("sample_size", sample_size);
        vars.insert("sample_table", sample);
        vars.insert("stats_table", stats);

        self.prompts.render(PromptId::Insights, &borrowed(&vars))
    }

    /// The review prompt, embedding the first response verbatim
    pub fn review_prompt(&self, summary: &Summary, insights: &str) -> Result<String> {
        let mut vars = self.key_figures(summary);
        vars.insert("insights", insights.to_string());

        self.prompts.render(PromptId::ExpertReview, &borrowed(&vars))
    }

    /// Ask for commentary, and for a review of it when enabled
    ///
    /// Only prompt rendering can fail here; endpoint failures are folded
    /// into the returned `Insights`.
    pub async fn generate(&self, table: &TransactionTable, summary: &Summary) -> Result<Insights> {
        let prompt = self.insight_prompt(table, summary)?;
        info!(
            model = %self.client.model(),
            host = %self.client.host(),
            "Requesting LLM insights"
        );
        let commentary = call(&self.client, &prompt).await;

        let review = match (&commentary, &self.review_client) {
            (Commentary::Generated(text), Some(reviewer)) => {
                let prompt = self.review_prompt(summary, text)?;
                info!(model = %reviewer.model(), "Requesting expert review");
                Some(call(reviewer, &prompt).await)
            }
            _ => None,
        };

        Ok(Insights { commentary, review })
    }

    fn key_figures(&self, summary: &Summary) -> HashMap<&'static str, String> {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "n/a".to_string())
        };

        HashMap::from([
            ("row_count", summary.row_count.to_string()),
            ("start_date", date(summary.start_date)),
            ("end_date", date(summary.end_date)),
            (
                "total_debit",
                format_money(&self.currency_symbol, summary.total_debit),
            ),
            (
                "total_credit",
                format_money(&self.currency_symbol, summary.total_credit),
            ),
        ])
    }
}

async fn call(client: &LlmClient, prompt: &str) -> Commentary {
    match client.generate(prompt).await {
        Ok(text) => Commentary::Generated(text),
        Err(e) => {
            warn!(model = %client.model(), error = %e, "LLM call failed; continuing without it");
            let reason = match e {
                Error::InsightUnavailable(reason) => reason,
                other => other.to_string(),
            };
            Commentary::Unavailable { reason }
        }
    }
}

fn borrowed<'a>(vars: &'a HashMap<&'static str, String>) -> HashMap<&'a str, &'a str> {
    vars.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

/// The first `rows` transactions as a pipe-delimited table
///
/// Only role-bound columns appear, in source order.
pub fn sample_table(table: &TransactionTable, rows: usize) -> String {
    let columns: Vec<(ColumnRole, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| table.columns.role_at(i).map(|role| (role, h.as_str())))
        .collect();

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(
        &columns
            .iter()
            .map(|(_, h)| escape_cell(h))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    out.push_str(" |\n|");
    out.push_str(&" --- |".repeat(columns.len()));
    out.push('\n');

    for tx in table.transactions.iter().take(rows) {
        let cells: Vec<String> = columns.iter().map(|(role, _)| cell(tx, *role)).collect();
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }

    out.trim_end().to_string()
}

fn cell(tx: &Transaction, role: ColumnRole) -> String {
    match role {
        ColumnRole::Date => tx.date.format("%Y-%m-%d").to_string(),
        r if r.is_numeric() => tx.number(r).map(|n| format!("{:.2}", n)).unwrap_or_default(),
        r => tx.text(r).map(escape_cell).unwrap_or_default(),
    }
}
