//! Sift Core Library
//!
//! Bank statement analysis, one CSV at a time:
//! - CSV loading with alias-based column detection
//! - Descriptive statistics and missing-value counts
//! - SVG charts (monthly volume, transaction types, top categories)
//! - Commentary from a local LLM (Ollama), with an optional expert review
//! - Markdown report assembly

pub mod charts;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod insights;
pub mod llm;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod report;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use charts::{ChartArtifact, ChartKind, ChartRenderer};
pub use config::{AnalyzerConfig, LlmBackendKind};
pub use error::{Error, Result};
pub use insights::{Commentary, InsightGenerator, Insights};
pub use llm::{LlmBackend, LlmClient, MockBackend, OllamaBackend};
pub use loader::{load_file, load_reader, LoaderOptions, NumberFormat};
pub use models::{ColumnMap, ColumnRole, Transaction, TransactionTable};
pub use pipeline::{Analyzer, RunOutcome};
pub use profile::{profile, ColumnStats, MissingCount, Summary};
pub use prompts::{PromptId, PromptLibrary};
pub use report::ReportAssembler;
