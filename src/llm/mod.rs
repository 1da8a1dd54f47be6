//! LLM integration for doppel.
//!
//! Talks to OpenAI-compatible chat-completions endpoints over reqwest.
//! `LlmProvider` is the seam the engines depend on; tests substitute mocks.

mod costs;
pub mod openai;
pub mod provider;
pub mod retry;

pub use costs::{estimate_cost, model_cost};
pub use openai::{OPENAI_API_URL, OpenAiProvider};
pub use provider::*;
pub use retry::{RetryOutcome, RetryPolicy};

use std::sync::Arc;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub base_url: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    if config.base_url.trim().is_empty() {
        return Err(LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: "base URL is empty".to_string(),
        });
    }

    let provider = OpenAiProvider::new(config.api_key.clone(), &config.model)
        .with_base_url(&config.base_url);
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using chat-completions provider");
    Ok(Arc::new(provider))
}
