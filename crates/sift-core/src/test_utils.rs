//! Test utilities for sift-core
//!
//! A mock Ollama server that answers `/api/tags` and `/api/generate` with a
//! configurable behaviour and records the requests it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// How the mock answers `/api/generate`
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 200 with this text as the `response` field
    Respond(String),
    /// Fail with this HTTP status
    Fail(u16),
    /// Sleep before answering, to trip client timeouts
    Stall(Duration),
}

/// A request received by the mock server
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

struct ServerState {
    behavior: MockBehavior,
    requests: Mutex<Vec<GenerateRequest>>,
}

/// Mock Ollama server for integration tests
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start a server that answers every prompt with `text`
    pub async fn start(text: &str) -> Self {
        Self::start_with(MockBehavior::Respond(text.to_string())).await
    }

    /// Start the mock server on an available port
    pub async fn start_with(behavior: MockBehavior) -> Self {
        let state = Arc::new(ServerState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Generate requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2025-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.requests.lock().unwrap().push(request.clone());

    let text = match &state.behavior {
        MockBehavior::Respond(text) => text.clone(),
        MockBehavior::Fail(status) => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, "mock failure").into_response();
        }
        MockBehavior::Stall(delay) => {
            tokio::time::sleep(*delay).await;
            "late response".to_string()
        }
    };

    Json(GenerateResponse {
        model: request.model,
        response: text,
        done: true,
    })
    .into_response()
}
