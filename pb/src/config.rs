//! PitchBot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main PitchBot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Idea description file read by `run`, `pitch` and `prompt`
    pub input: PathBuf,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Directory whose `pitch.pmt` overrides the embedded prompt
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: PathBuf,

    /// Completion service configuration
    pub llm: LlmConfig,

    /// Presentation service configuration
    pub slides: SlidesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("user_input.json"),
            log_level: None,
            prompts_dir: PathBuf::from(".pitchbot/prompts"),
            llm: LlmConfig::default(),
            slides: SlidesConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the completion service API key is present in the environment.
    pub fn validate(&self) -> Result<()> {
        debug!(api_key_env = %self.llm.api_key_env, "Config::validate: called");
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .pitchbot.yml
        let local_config = PathBuf::from(".pitchbot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/pitchbot/pitchbot.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed: the full load that follows reports them.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".pitchbot.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pitchbot").join("pitchbot.yml"))
}

/// Completion service configuration
///
/// Model, temperature and output length are fixed per run; callers of the
/// generator never choose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_ms: 120_000,
        }
    }
}

/// Presentation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidesConfig {
    /// Slides REST API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// OAuth client secrets for an installed application
    #[serde(rename = "credentials-file")]
    pub credentials_file: PathBuf,

    /// Where the authorized-user token is cached between runs
    #[serde(rename = "token-file")]
    pub token_file: PathBuf,

    /// Title given to each new presentation
    #[serde(rename = "deck-title")]
    pub deck_title: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// How long to wait for the browser redirect during consent
    #[serde(rename = "consent-timeout-secs")]
    pub consent_timeout_secs: u64,
}

impl Default for SlidesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slides.googleapis.com".to_string(),
            credentials_file: PathBuf::from("creds.json"),
            token_file: PathBuf::from("token.json"),
            deck_title: "PitchBot Deck".to_string(),
            timeout_ms: 60_000,
            consent_timeout_secs: 300,
        }
    }
}
