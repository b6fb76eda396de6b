//! Local text-generation backend abstraction
//!
//! - `LlmBackend` trait: prompt in, verbatim text out
//! - `LlmClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! Every failure at this boundary (unreachable host, timeout, HTTP error,
//! malformed body) surfaces as `Error::InsightUnavailable`. There are no
//! retries: each call is a single attempt.

mod mock;
mod ollama;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::config::{LlmBackendKind, LlmConfig};
use crate::error::Result;

/// Trait defining the interface for text-generation backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a prompt and return the model's full response text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete LLM client enum
#[derive(Clone)]
pub enum LlmClient {
    /// Ollama HTTP API
    Ollama(OllamaBackend),
    /// Canned responses for tests and offline runs
    Mock(MockBackend),
}

impl LlmClient {
    /// Build the client selected by `[llm] backend`
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.backend {
            LlmBackendKind::Ollama => Ok(LlmClient::Ollama(OllamaBackend::new(
                &config.host,
                &config.model,
                config.timeout(),
            )?)),
            LlmBackendKind::Mock => Ok(LlmClient::Mock(MockBackend::new().with_model(&config.model))),
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        LlmClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    ///
    /// The expert review pass uses this to talk to its own model on the same host.
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            LlmClient::Ollama(b) => LlmClient::Ollama(b.with_model(model)),
            LlmClient::Mock(b) => LlmClient::Mock(b.with_model(model)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            LlmClient::Ollama(_) => "ollama",
            LlmClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl LlmBackend for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            LlmClient::Ollama(b) => b.generate(prompt).await,
            LlmClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            LlmClient::Ollama(b) => b.health_check().await,
            LlmClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            LlmClient::Ollama(b) => b.model(),
            LlmClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            LlmClient::Ollama(b) => b.host(),
            LlmClient::Mock(b) => b.host(),
        }
    }
}
