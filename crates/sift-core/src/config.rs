//! Analyzer configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An override file (`--config PATH`, else ~/.config/sift/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file was used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::loader::{LoaderOptions, NumberFormat};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/sift.toml");

/// Which text-generation backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackendKind {
    #[default]
    Ollama,
    /// Canned responses, no network
    Mock,
}

impl LlmBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for LlmBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputConfig {
    pub delimiter: char,
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
    pub date_formats: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            thousands_separator: Some(','),
            date_formats: [
                "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y", "%m/%d/%Y", "%Y/%m/%d",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputConfig {
    pub plots_dir: PathBuf,
    pub report_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plots_dir: PathBuf::from("plots"),
            report_path: PathBuf::from("report/analysis_report.md"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    /// How many categories the top-categories chart keeps
    pub top_categories: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            top_categories: 10,
            width: 1200,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmConfig {
    pub backend: LlmBackendKind,
    pub host: String,
    pub model: String,
    /// Model used for the expert review pass
    pub review_model: String,
    pub expert_review: bool,
    pub timeout_secs: u64,
    /// Rows included in the prompt sample
    pub sample_rows: usize,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackendKind::Ollama,
            host: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            review_model: "mistral".to_string(),
            expert_review: true,
            timeout_secs: 60,
            sample_rows: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfig {
    pub title: String,
    pub currency_symbol: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Bank Transaction Analysis Report".to_string(),
            currency_symbol: "£".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptConfig {
    /// Directory checked for `<prompt_id>.md` overrides
    pub override_dir: Option<PathBuf>,
}

/// Full analyzer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzerConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub charts: ChartConfig,
    pub llm: LlmConfig,
    pub report: ReportConfig,
    pub prompts: PromptConfig,
}

impl AnalyzerConfig {
    /// Load config from an explicit path, the default override path, or the embedded defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// override file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let content = match explicit {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    debug!(path = %path.display(), "Using config override");
                    fs::read_to_string(&path).map_err(|e| {
                        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
                    })?
                }
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Load config and apply environment overrides from the process environment
    pub fn from_env(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::load(explicit)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment-style overrides from a lookup function
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.llm.host = normalize_host(&host);
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = lookup("SIFT_REVIEW_MODEL") {
            self.llm.review_model = model;
        }
        if let Some(backend) = lookup("SIFT_LLM_BACKEND") {
            self.llm.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(dir) = lookup("SIFT_PLOTS_DIR") {
            self.output.plots_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("SIFT_REPORT_PATH") {
            self.output.report_path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Options for the CSV loader
    pub fn loader_options(&self) -> Result<LoaderOptions> {
        if !self.input.delimiter.is_ascii() {
            return Err(Error::Config(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.input.delimiter
            )));
        }
        if Some(self.input.decimal_separator) == self.input.thousands_separator {
            return Err(Error::Config(
                "Decimal and thousands separators must differ".to_string(),
            ));
        }

        Ok(LoaderOptions {
            delimiter: self.input.delimiter as u8,
            number_format: NumberFormat {
                decimal_separator: self.input.decimal_separator,
                thousands_separator: self.input.thousands_separator,
            },
            date_formats: self.input.date_formats.clone(),
        })
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sift").join("config.toml"))
}

/// Accept `host:port` as well as full URLs, like the Ollama CLI does
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    input: Option<RawInput>,
    output: Option<RawOutput>,
    charts: Option<RawCharts>,
    llm: Option<RawLlm>,
    report: Option<RawReport>,
    prompts: Option<RawPrompts>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    delimiter: Option<String>,
    decimal_separator: Option<String>,
    thousands_separator: Option<String>,
    date_formats: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    plots_dir: Option<PathBuf>,
    report_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawCharts {
    top_categories: Option<usize>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawLlm {
    backend: Option<LlmBackendKind>,
    host: Option<String>,
    model: Option<String>,
    review_model: Option<String>,
    expert_review: Option<bool>,
    timeout_secs: Option<u64>,
    sample_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    title: Option<String>,
    currency_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrompts {
    override_dir: Option<PathBuf>,
}

/// A config value that must be exactly one character
fn single_char(field: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Config(format!(
            "{} must be a single character, got \"{}\"",
            field, value
        ))),
    }
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AnalyzerConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalyzerConfig::default();

    if let Some(input) = raw.input {
        if let Some(d) = input.delimiter {
            config.input.delimiter = single_char("input.delimiter", &d)?;
        }
        if let Some(d) = input.decimal_separator {
            config.input.decimal_separator = single_char("input.decimal_separator", &d)?;
        }
        if let Some(t) = input.thousands_separator {
            // An empty string disables thousands grouping
            config.input.thousands_separator = if t.is_empty() {
                None
            } else {
                Some(single_char("input.thousands_separator", &t)?)
            };
        }
        if let Some(formats) = input.date_formats {
            if formats.is_empty() {
                return Err(Error::Config(
                    "input.date_formats must list at least one format".to_string(),
                ));
            }
            config.input.date_formats = formats;
        }
    }

    if let Some(output) = raw.output {
        if let Some(dir) = output.plots_dir {
            config.output.plots_dir = dir;
        }
        if let Some(path) = output.report_path {
            config.output.report_path = path;
        }
    }

    if let Some(charts) = raw.charts {
        if let Some(n) = charts.top_categories {
            config.charts.top_categories = n;
        }
        if let Some(w) = charts.width {
            config.charts.width = w;
        }
        if let Some(h) = charts.height {
            config.charts.height = h;
        }
    }

    if let Some(llm) = raw.llm {
        if let Some(backend) = llm.backend {
            config.llm.backend = backend;
        }
        if let Some(host) = llm.host {
            config.llm.host = normalize_host(&host);
        }
        if let Some(model) = llm.model {
            config.llm.model = model;
        }
        if let Some(model) = llm.review_model {
            config.llm.review_model = model;
        }
        if let Some(review) = llm.expert_review {
            config.llm.expert_review = review;
        }
        if let Some(timeout) = llm.timeout_secs {
            config.llm.timeout_secs = timeout;
        }
        if let Some(rows) = llm.sample_rows {
            config.llm.sample_rows = rows;
        }
    }

    if let Some(report) = raw.report {
        if let Some(title) = report.title {
            config.report.title = title;
        }
        if let Some(symbol) = report.currency_symbol {
            config.report.currency_symbol = symbol;
        }
    }

    if let Some(prompts) = raw.prompts {
        config.prompts.override_dir = prompts.override_dir;
    }

    Ok(config)
}
