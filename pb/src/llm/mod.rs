//! LLM Client module for PitchBot
//!
//! Provides the completion client abstraction and pitch generation.

use std::sync::Arc;

use tracing::{debug, info, warn};

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

/// Ask the completion service for pitch deck copy
///
/// Returns the first choice's text with surrounding whitespace trimmed.
/// Service and transport errors are returned unchanged.
pub async fn generate_pitch(llm: &dyn LlmClient, prompt: &str) -> Result<String, LlmError> {
    debug!(prompt_len = prompt.len(), "generate_pitch: called");
    info!("Requesting pitch from completion service");

    let response = llm.complete(CompletionRequest::from_prompt(prompt)).await?;
    if response.stop_reason == StopReason::MaxTokens {
        warn!("Pitch was cut off at the output token limit");
    }

    let text = response
        .content
        .ok_or_else(|| LlmError::InvalidResponse("completion returned no content".to_string()))?;

    info!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "Pitch received"
    );
    Ok(text.trim().to_string())
}
