//! Idea description loading
//!
//! The idea file is a flat mapping with four required text fields. JSON is
//! the default format; `.yml`/`.yaml` files are read as YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Required keys, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 4] = ["problem", "solution-idea", "tone", "audience"];

/// The four-field startup concept the pitch is written from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaDescription {
    pub problem: String,
    #[serde(rename = "solution-idea")]
    pub solution_idea: String,
    pub tone: String,
    pub audience: String,
}

/// Errors raised while loading an idea description
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Missing or empty field: {field}")]
    MissingField { field: String },

    #[error("Field is not text: {field}")]
    NotText { field: String },

    #[error("Malformed input {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    /// Name of the offending field, for field-level errors
    pub fn field(&self) -> Option<&str> {
        match self {
            InputError::MissingField { field } | InputError::NotText { field } => Some(field),
            _ => None,
        }
    }
}

/// Load and validate an idea description from a file
pub fn load_input(path: impl AsRef<Path>) -> Result<IdeaDescription, InputError> {
    let path = path.as_ref();
    debug!(?path, "load_input: called");

    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );

    let idea = parse_input(&content, is_yaml).map_err(|e| match e {
        InputError::Malformed { reason, .. } => InputError::Malformed {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;

    info!("Loaded idea description from {}", path.display());
    Ok(idea)
}

/// Parse and validate idea text already in memory
///
/// `Malformed` errors from here carry an empty path; `load_input` fills it in.
pub fn parse_input(content: &str, is_yaml: bool) -> Result<IdeaDescription, InputError> {
    debug!(content_len = content.len(), %is_yaml, "parse_input: called");

    let value: serde_json::Value = if is_yaml {
        serde_yaml::from_str(content).map_err(|e| malformed(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?
    };

    let map = value
        .as_object()
        .ok_or_else(|| malformed("top level is not a mapping".to_string()))?;

    let mut values = Vec::with_capacity(REQUIRED_FIELDS.len());
    for field in REQUIRED_FIELDS {
        let text = match map.get(field) {
            None | Some(serde_json::Value::Null) => {
                debug!(%field, "parse_input: field absent");
                return Err(InputError::MissingField {
                    field: field.to_string(),
                });
            }
            Some(serde_json::Value::String(s)) => s,
            Some(_) => {
                debug!(%field, "parse_input: field is not a string");
                return Err(InputError::NotText {
                    field: field.to_string(),
                });
            }
        };
        if text.trim().is_empty() {
            debug!(%field, "parse_input: field is blank");
            return Err(InputError::MissingField {
                field: field.to_string(),
            });
        }
        values.push(text.clone());
    }

    let [problem, solution_idea, tone, audience]: [String; 4] = values
        .try_into()
        .map_err(|_| malformed("field count mismatch".to_string()))?;

    Ok(IdeaDescription {
        problem,
        solution_idea,
        tone,
        audience,
    })
}

fn malformed(reason: String) -> InputError {
    InputError::Malformed {
        path: PathBuf::new(),
        reason,
    }
}
