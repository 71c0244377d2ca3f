//! PitchBot - AI startup pitch deck generator
//!
//! Turns a four-field idea description into a Google Slides deck: a language
//! model writes the copy, a numbered-heading splitter cuts it into sections,
//! and each section becomes one title-and-body slide.
//!
//! # Modules
//!
//! - [`idea`] - Idea description loading and validation
//! - [`prompts`] - Pitch prompt template
//! - [`llm`] - Completion client and pitch generation
//! - [`sections`] - Section splitter
//! - [`slides`] - Google Slides credentials, client, and deck builder
//! - [`pipeline`] - End-to-end orchestration
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod idea;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod sections;
pub mod slides;

// Re-export commonly used types
pub use config::{Config, LlmConfig, SlidesConfig};
pub use idea::{IdeaDescription, InputError, load_input};
pub use llm::{LlmClient, LlmError, OpenAIClient, create_client, generate_pitch};
pub use pipeline::{Pipeline, PipelineEvent, PipelineOutcome};
pub use prompts::{PromptLoader, build_prompt};
pub use sections::{SectionMap, extract_sections, parse_heading};
pub use slides::{
    AuthError, GoogleSlidesConnector, SlidesConnector, SlidesError, SlidesService, build_deck, deck_url,
};
