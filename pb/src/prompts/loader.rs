//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::idea::IdeaDescription;

/// Context for rendering the pitch template
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext<'a> {
    pub problem: &'a str,
    pub solution_idea: &'a str,
    pub tone: &'a str,
    pub audience: &'a str,
}

impl<'a> From<&'a IdeaDescription> for PromptContext<'a> {
    fn from(idea: &'a IdeaDescription) -> Self {
        Self {
            problem: &idea.problem,
            solution_idea: &idea.solution_idea,
            tone: &idea.tone,
            audience: &idea.audience,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.pitchbot/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates from `dir` when it exists
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let exists = dir.exists();
        debug!(?dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            override_dir: exists.then(|| dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Idea text is embedded verbatim, never HTML-escaped
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in override directory");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the pitch prompt for an idea
    pub fn render_pitch(&self, idea: &IdeaDescription) -> Result<String> {
        debug!("PromptLoader::render_pitch: called");
        let prompt = self.render("pitch", &PromptContext::from(idea))?;
        info!("Rendered pitch prompt ({} chars)", prompt.len());
        Ok(prompt)
    }
}

/// Render the embedded pitch prompt for an idea
///
/// Only the four idea values vary between calls; the surrounding text is fixed.
pub fn build_prompt(idea: &IdeaDescription) -> Result<String> {
    PromptLoader::embedded_only().render_pitch(idea)
}
