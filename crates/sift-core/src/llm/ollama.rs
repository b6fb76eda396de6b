//! Ollama backend implementation
//!
//! Talks to the Ollama HTTP API: `POST /api/generate` with streaming disabled
//! for completions and `GET /api/tags` as a liveness probe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::LlmBackend;

/// Ollama backend with a bounded request timeout
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    /// Create a new instance with a different model, sharing the HTTP client
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
            timeout: self.timeout,
        }
    }

    /// Turn a transport error into the reason shown in the report placeholder
    fn describe(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!(
                "request to {} timed out after {}s",
                self.base_url,
                self.timeout.as_secs()
            )
        } else if e.is_connect() {
            format!("could not connect to {}", self.base_url)
        } else {
            e.to_string()
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            "Sending prompt to Ollama"
        );

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::InsightUnavailable(self.describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InsightUnavailable(format!(
                "Ollama returned {} for model {}: {}",
                status,
                self.model,
                body.trim()
            )));
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            Error::InsightUnavailable(format!("malformed Ollama response: {}", self.describe(&e)))
        })?;
        debug!(
            response_chars = ollama_response.response.len(),
            "Ollama response received"
        );

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
