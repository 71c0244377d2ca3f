//! Presentation service error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while obtaining Google credentials
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client secrets file not found: {0}")]
    CredentialsNotFound(PathBuf),

    #[error("Invalid credentials file {path}: {reason}")]
    InvalidCredentials { path: PathBuf, reason: String },

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Authorization callback error: {0}")]
    Callback(String),

    #[error("Failed to store token at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by presentation service calls
#[derive(Debug, Error)]
pub enum SlidesError {
    #[error("Slides API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
