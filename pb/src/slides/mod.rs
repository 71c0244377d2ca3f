//! Google Slides integration
//!
//! - [`auth`] - OAuth credential cache, refresh, and consent flow
//! - [`callback`] - loopback redirect server used during consent
//! - [`client`] - `SlidesService` trait and REST client
//! - [`deck`] - one-slide-per-section deck builder

use async_trait::async_trait;
use tracing::debug;

pub mod auth;
pub mod callback;
pub mod client;
pub mod deck;
mod error;
mod pkce;
pub mod types;

pub use auth::{AuthorizedUser, Authenticator, ClientSecrets, SLIDES_SCOPE};
pub use client::{GoogleSlidesClient, SlidesService};
pub use deck::{DeckSummary, SECTION_LAYOUT, build_deck, deck_url};
pub use error::{AuthError, SlidesError};
pub use types::{Page, PlaceholderType, PredefinedLayout, Presentation, Request};

use crate::config::SlidesConfig;

/// Produces an authorized slides service on demand
///
/// Authorization may be interactive, so it is deferred until the pipeline
/// actually needs the presentation service.
#[async_trait]
pub trait SlidesConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SlidesService>, SlidesError>;
}

/// Connector that authorizes with Google OAuth and talks to the REST API
pub struct GoogleSlidesConnector {
    config: SlidesConfig,
}

impl GoogleSlidesConnector {
    pub fn new(config: SlidesConfig) -> Self {
        Self { config }
    }

    /// Run credential resolution only
    pub async fn authorize(&self) -> Result<AuthorizedUser, SlidesError> {
        debug!("GoogleSlidesConnector::authorize: called");
        let authenticator = Authenticator::new(&self.config)?;
        Ok(authenticator.authorize().await?)
    }
}

#[async_trait]
impl SlidesConnector for GoogleSlidesConnector {
    async fn connect(&self) -> Result<Box<dyn SlidesService>, SlidesError> {
        debug!("GoogleSlidesConnector::connect: called");
        let user = self.authorize().await?;
        Ok(Box::new(GoogleSlidesClient::new(&self.config, user.token)?))
    }
}
