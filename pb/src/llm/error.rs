//! LLM error types

use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// None of these are retried; they propagate to the caller as-is.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: '{0}'. Supported: openai")]
    UnknownProvider(String),
}

impl LlmError {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
