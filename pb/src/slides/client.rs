//! Slides service trait and its Google REST implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::SlidesError;
use super::types::{BatchUpdateRequest, BatchUpdateResponse, Page, PredefinedLayout, Presentation, Request};
use crate::config::SlidesConfig;

/// Remote presentation store
///
/// Calls are independent round trips; the caller awaits each before issuing
/// the next.
#[async_trait]
pub trait SlidesService: Send + Sync {
    /// Create an empty presentation with the given title
    async fn create_presentation(&self, title: &str) -> Result<Presentation, SlidesError>;

    /// Apply a list of requests to a presentation
    async fn batch_update(&self, presentation_id: &str, requests: Vec<Request>)
    -> Result<BatchUpdateResponse, SlidesError>;

    /// Fetch one page (slide) with its elements
    async fn get_page(&self, presentation_id: &str, page_id: &str) -> Result<Page, SlidesError>;

    /// Append a slide with the given layout, returning its object id
    async fn create_slide(&self, presentation_id: &str, layout: PredefinedLayout) -> Result<String, SlidesError> {
        let response = self
            .batch_update(presentation_id, vec![Request::create_slide(layout)])
            .await?;

        response
            .replies
            .into_iter()
            .next()
            .and_then(|reply| reply.create_slide)
            .map(|reply| reply.object_id)
            .ok_or_else(|| SlidesError::InvalidResponse("createSlide reply missing objectId".to_string()))
    }
}

/// Google Slides REST client authorized with a bearer token
pub struct GoogleSlidesClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GoogleSlidesClient {
    pub fn new(config: &SlidesConfig, access_token: impl Into<String>) -> Result<Self, SlidesError> {
        debug!(base_url = %config.base_url, "GoogleSlidesClient::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SlidesError> {
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "GoogleSlidesClient::decode: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(SlidesError::ApiError {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SlidesError::InvalidResponse(e.to_string()))
    }
}

/// Pull `error.message` out of a Google error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SlidesService for GoogleSlidesClient {
    async fn create_presentation(&self, title: &str) -> Result<Presentation, SlidesError> {
        debug!(%title, "GoogleSlidesClient::create_presentation: called");
        let response = self
            .http
            .post(format!("{}/v1/presentations", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse, SlidesError> {
        debug!(%presentation_id, request_count = requests.len(), "GoogleSlidesClient::batch_update: called");
        let response = self
            .http
            .post(format!("{}/v1/presentations/{}:batchUpdate", self.base_url, presentation_id))
            .bearer_auth(&self.access_token)
            .json(&BatchUpdateRequest { requests: &requests })
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn get_page(&self, presentation_id: &str, page_id: &str) -> Result<Page, SlidesError> {
        debug!(%presentation_id, %page_id, "GoogleSlidesClient::get_page: called");
        let response = self
            .http
            .get(format!("{}/v1/presentations/{}/pages/{}", self.base_url, presentation_id, page_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::decode(response).await
    }
}
