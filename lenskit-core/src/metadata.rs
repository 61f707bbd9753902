//! Publication metadata documents (v2 schema).

use serde::Serialize;
use uuid::Uuid;

/// App id attached to text-only posts.
pub const APP_ID_TEXT: &str = "lensfrens";
/// App id attached to video posts.
pub const APP_ID_VIDEO: &str = "lenstube";

/// Primary content focus of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MainContentFocus {
    /// Text without attachments.
    TextOnly,
    /// Video with a media attachment.
    Video,
}

/// A media reference inside a metadata document.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    /// MIME type (e.g. `video/mp4`).
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Content URI of the uploaded media (`ipfs://...`).
    pub item: String,
}

/// The user-authored content packaged as a versioned JSON document, uploaded
/// to storage and referenced by a content URI.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataDocument {
    /// Metadata schema version.
    pub version: String,
    /// Post body.
    pub content: String,
    /// Mirrors `content`, per the v2 schema.
    pub description: String,
    /// Mirrors `content`, per the v2 schema.
    pub name: String,
    /// Author page, when a handle is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Fresh random identifier for this document.
    pub metadata_id: String,
    /// Primary content focus.
    #[serde(rename = "mainContentFocus")]
    pub main_content_focus: MainContentFocus,
    /// Free-form attributes; always empty for this app.
    pub attributes: Vec<serde_json::Value>,
    /// Content locale.
    pub locale: String,
    /// Media references; empty for text-only posts.
    pub media: Vec<MediaItem>,
    /// Publishing app id.
    #[serde(rename = "appId")]
    pub app_id: String,
}

impl MetadataDocument {
    /// Builds a document for a post. With media the document is a video post
    /// published under [`APP_ID_VIDEO`]; without, a text-only post under
    /// [`APP_ID_TEXT`] with an empty media list.
    #[must_use]
    pub fn new(content: &str, media: Option<MediaItem>, author_handle: Option<&str>) -> Self {
        let has_media = media.is_some();
        Self {
            version: "2.0.0".to_string(),
            content: content.to_string(),
            description: content.to_string(),
            name: content.to_string(),
            external_url: author_handle.map(|handle| format!("https://lenstube.xyz/{handle}")),
            metadata_id: Uuid::new_v4().to_string(),
            main_content_focus: if has_media {
                MainContentFocus::Video
            } else {
                MainContentFocus::TextOnly
            },
            attributes: Vec::new(),
            locale: "en-US".to_string(),
            media: media.into_iter().collect(),
            app_id: if has_media { APP_ID_VIDEO } else { APP_ID_TEXT }.to_string(),
        }
    }
}
