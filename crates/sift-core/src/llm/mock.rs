//! Mock backend for testing
//!
//! Returns a fixed response (or a fixed failure) and records every prompt it
//! was sent. Also backs `backend = "mock"` for runs without an Ollama server.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::LlmBackend;

const DEFAULT_RESPONSE: &str = "## Key Insights\n\n\
- Mock backend response: no language model was contacted.\n\
- Set `[llm] backend = \"ollama\"` to generate real commentary.\n";

/// Mock LLM backend
#[derive(Clone)]
pub struct MockBackend {
    model: String,
    /// `None` makes every call fail with `InsightUnavailable`
    response: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a healthy mock returning a canned response
    pub fn new() -> Self {
        Self {
            model: "mock".to_string(),
            response: Some(DEFAULT_RESPONSE.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that answers every prompt with `text`
    pub fn with_response(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
            ..Self::new()
        }
    }

    /// Mock whose endpoint is unreachable
    pub fn unavailable() -> Self {
        Self {
            response: None,
            ..Self::new()
        }
    }

    /// Create a new instance with a different model
    ///
    /// Clones share the recorded prompt log.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.response
            .clone()
            .ok_or_else(|| Error::InsightUnavailable("mock endpoint unavailable".to_string()))
    }

    async fn health_check(&self) -> bool {
        self.response.is_some()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_prompts_across_clones() {
        let mock = MockBackend::with_response("ok");
        let review = mock.with_model("mistral");

        mock.generate("first").await.unwrap();
        review.generate("second").await.unwrap();

        assert_eq!(mock.prompts(), ["first", "second"]);
        assert_eq!(review.model(), "mistral");
    }

    #[tokio::test]
    async fn test_unavailable_mock_fails() {
        let mock = MockBackend::unavailable();
        let err = mock.generate("x").await.unwrap_err();
        assert!(matches!(err, Error::InsightUnavailable(_)));
        assert!(!mock.health_check().await);
    }
}
