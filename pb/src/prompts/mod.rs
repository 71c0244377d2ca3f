//! Prompt templates
//!
//! The pitch prompt is a Handlebars template embedded in the binary. A
//! `pitch.pmt` in an override directory replaces it.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader, build_prompt};
