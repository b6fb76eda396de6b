//! Error types for Sift

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Load failed for {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Write failed for {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Chart rendering error: {0}")]
    Chart(String),

    #[error("LLM insights unavailable: {0}")]
    InsightUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures the pipeline recovers from (the report still gets written)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsightUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
