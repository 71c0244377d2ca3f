//! Google Slides REST resource types
//!
//! Only the fields this crate reads or writes are modelled; unknown fields in
//! responses are ignored.

use serde::{Deserialize, Serialize};

/// A presentation as returned by `presentations.create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub presentation_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Predefined slide layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredefinedLayout {
    TitleAndBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReference {
    pub predefined_layout: PredefinedLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlideRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub slide_layout_reference: LayoutReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    pub object_id: String,
    pub insertion_index: u32,
    pub text: String,
}

/// One entry of a `batchUpdate` request list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    CreateSlide(CreateSlideRequest),
    InsertText(InsertTextRequest),
}

impl Request {
    /// Create a slide with a predefined layout, letting the service pick its id
    pub fn create_slide(layout: PredefinedLayout) -> Self {
        Request::CreateSlide(CreateSlideRequest {
            object_id: None,
            slide_layout_reference: LayoutReference {
                predefined_layout: layout,
            },
        })
    }

    /// Insert text at the start of a shape
    pub fn insert_text(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Request::InsertText(InsertTextRequest {
            object_id: object_id.into(),
            insertion_index: 0,
            text: text.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub requests: &'a [Request],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub presentation_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// One reply per request; only `createSlide` replies carry data we use
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default)]
    pub create_slide: Option<CreateSlideReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlideReply {
    pub object_id: String,
}

/// A slide as returned by `presentations.pages.get`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub object_id: String,
    #[serde(default)]
    pub page_elements: Vec<PageElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub object_id: String,
    #[serde(default)]
    pub shape: Option<Shape>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub placeholder: Option<Placeholder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Placeholder {
    #[serde(rename = "type", default)]
    pub kind: PlaceholderType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceholderType {
    Title,
    Body,
    #[default]
    #[serde(other)]
    Other,
}

/// Object ids of a slide's title and body placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderIds {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Page {
    /// Find the title and body placeholders; a later element of the same type wins
    pub fn placeholder_ids(&self) -> PlaceholderIds {
        let mut ids = PlaceholderIds::default();
        for element in &self.page_elements {
            let Some(placeholder) = element.shape.as_ref().and_then(|s| s.placeholder.as_ref()) else {
                continue;
            };
            match placeholder.kind {
                PlaceholderType::Title => ids.title = Some(element.object_id.clone()),
                PlaceholderType::Body => ids.body = Some(element.object_id.clone()),
                PlaceholderType::Other => {}
            }
        }
        ids
    }
}
