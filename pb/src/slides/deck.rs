//! Deck building: one slide per section

use tracing::{debug, info, warn};

use super::client::SlidesService;
use super::types::{PredefinedLayout, Request};
use super::SlidesError;
use crate::sections::SectionMap;

/// Layout used for every section slide
pub const SECTION_LAYOUT: PredefinedLayout = PredefinedLayout::TitleAndBody;

/// Human-readable edit URL for a presentation
pub fn deck_url(presentation_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{}/edit", presentation_id)
}

/// What the deck builder did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckSummary {
    /// Created slide ids, in deck order
    pub slide_ids: Vec<String>,
    /// Placeholder regions that were absent and left unfilled
    pub skipped_placeholders: usize,
}

/// Append one populated slide per section, in mapping order
///
/// Per section: create the slide, read it back to find its placeholders, then
/// insert the title and body in one batch. A missing placeholder is skipped.
/// The first failing call aborts the build; slides already created stay.
pub async fn build_deck(
    service: &dyn SlidesService,
    presentation_id: &str,
    sections: &SectionMap,
) -> Result<DeckSummary, SlidesError> {
    debug!(%presentation_id, section_count = sections.len(), "build_deck: called");
    let mut summary = DeckSummary::default();

    for (index, (title, body)) in sections.iter().enumerate() {
        let slide_id = service.create_slide(presentation_id, SECTION_LAYOUT).await?;
        debug!(%slide_id, %title, "build_deck: slide created");

        let page = service.get_page(presentation_id, &slide_id).await?;
        let ids = page.placeholder_ids();

        let mut requests = Vec::with_capacity(2);
        match ids.title {
            Some(id) => requests.push(Request::insert_text(id, title)),
            None => {
                warn!(%slide_id, %title, "Slide has no title placeholder; title not inserted");
                summary.skipped_placeholders += 1;
            }
        }
        match ids.body {
            Some(id) => requests.push(Request::insert_text(id, body)),
            None => {
                warn!(%slide_id, %title, "Slide has no body placeholder; body not inserted");
                summary.skipped_placeholders += 1;
            }
        }

        if !requests.is_empty() {
            service.batch_update(presentation_id, requests).await?;
        }

        info!("Slide {} of {}: {}", index + 1, sections.len(), title);
        summary.slide_ids.push(slide_id);
    }

    Ok(summary)
}
