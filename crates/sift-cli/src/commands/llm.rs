//! LLM endpoint check

use anyhow::{Context, Result};
use sift_core::{AnalyzerConfig, LlmBackend, LlmClient};

/// Check that the configured LLM backend answers; returns whether it did
pub async fn cmd_check_llm(config: &AnalyzerConfig) -> Result<bool> {
    let client = LlmClient::from_config(&config.llm).context("Failed to create LLM client")?;

    println!("🤖 Checking {} backend", client.backend_name());
    println!("   Host: {}", client.host());
    println!("   Model: {}", client.model());
    if config.llm.expert_review {
        println!("   Review model: {}", config.llm.review_model);
    }
    println!();

    if client.health_check().await {
        println!("✅ Endpoint is reachable");
        return Ok(true);
    }

    println!("❌ Endpoint is not reachable");
    println!();
    println!("Make sure Ollama is running:");
    println!("  1. Install: https://ollama.ai");
    println!("  2. Start: ollama serve");
    println!("  3. Pull models: ollama pull {}", config.llm.model);
    if config.llm.expert_review {
        println!("                  ollama pull {}", config.llm.review_model);
    }
    println!();
    println!("Analysis still runs without it; the report gets a placeholder instead of insights.");
    Ok(false)
}
