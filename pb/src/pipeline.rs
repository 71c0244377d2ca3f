//! Pitch deck pipeline
//!
//! Load idea -> render prompt -> generate pitch -> split sections ->
//! authorize -> create presentation -> build deck. Each step runs to
//! completion before the next starts, and the first error ends the run.

use std::path::Path;
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::idea::{IdeaDescription, load_input};
use crate::llm::{LlmClient, generate_pitch};
use crate::prompts::PromptLoader;
use crate::sections::{SectionMap, extract_sections};
use crate::slides::{DeckSummary, SlidesConnector, build_deck, deck_url};

/// Progress notifications emitted while the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    InputLoaded,
    GeneratingPitch,
    PitchGenerated(String),
    SectionsParsed(Vec<String>),
    Authorized,
    PresentationCreated(String),
    DeckBuilt { slides: usize, skipped_placeholders: usize },
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub presentation_id: String,
    pub url: String,
    pub sections: SectionMap,
    pub deck: DeckSummary,
}

type Observer = Box<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Orchestrates one single-shot run
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    slides: Arc<dyn SlidesConnector>,
    prompts: PromptLoader,
    deck_title: String,
    observer: Option<Observer>,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        slides: Arc<dyn SlidesConnector>,
        prompts: PromptLoader,
        deck_title: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            slides,
            prompts,
            deck_title: deck_title.into(),
            observer: None,
        }
    }

    /// Receive progress events as the run advances
    pub fn with_observer(mut self, observer: impl Fn(&PipelineEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&self, event: PipelineEvent) {
        debug!(?event, "Pipeline::emit: called");
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }

    /// Load the idea and ask the completion service for pitch copy
    pub async fn generate(&self, input: &Path) -> Result<String> {
        debug!(?input, "Pipeline::generate: called");
        let idea = load_input(input).context("Failed to load idea description")?;
        self.emit(PipelineEvent::InputLoaded);

        self.generate_for(&idea).await
    }

    async fn generate_for(&self, idea: &IdeaDescription) -> Result<String> {
        let prompt = self.prompts.render_pitch(idea)?;

        self.emit(PipelineEvent::GeneratingPitch);
        let pitch = generate_pitch(self.llm.as_ref(), &prompt)
            .await
            .context("Pitch generation failed")?;
        self.emit(PipelineEvent::PitchGenerated(pitch.clone()));
        Ok(pitch)
    }

    /// Run the whole pipeline and return the deck location
    pub async fn run(&self, input: &Path) -> Result<PipelineOutcome> {
        info!("Pipeline starting with input {}", input.display());
        let pitch = self.generate(input).await?;

        let sections = extract_sections(&pitch);
        self.emit(PipelineEvent::SectionsParsed(
            sections.titles().map(str::to_string).collect(),
        ));

        let service = self
            .slides
            .connect()
            .await
            .context("Failed to authorize with Google Slides")?;
        self.emit(PipelineEvent::Authorized);

        let presentation = service
            .create_presentation(&self.deck_title)
            .await
            .context("Failed to create presentation")?;
        let presentation_id = presentation.presentation_id;
        info!(%presentation_id, "Created presentation");
        self.emit(PipelineEvent::PresentationCreated(presentation_id.clone()));

        let deck = build_deck(service.as_ref(), &presentation_id, &sections)
            .await
            .context("Failed to build deck")?;
        self.emit(PipelineEvent::DeckBuilt {
            slides: deck.slide_ids.len(),
            skipped_placeholders: deck.skipped_placeholders,
        });

        let url = deck_url(&presentation_id);
        info!(%url, "Pipeline finished");
        Ok(PipelineOutcome {
            presentation_id,
            url,
            sections,
            deck,
        })
    }
}
