//! Image regeneration request models.

use serde::Deserialize;
use utoipa::ToSchema;

pub(crate) fn default_image_mime() -> String {
    "image/png".to_string()
}

/// Single image input. Sources are tried in the order url, s3_key, data.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImageInput {
    /// S3 object URL, as returned by /doc/upload
    #[schema(example = "https://bucket.s3.eu-west-1.amazonaws.com/extracted/brochure/1a2b3c4d_page1_img1.png")]
    pub url: Option<String>,
    /// Direct S3 object key
    pub s3_key: Option<String>,
    /// Base64 encoded image, optionally with a data URL prefix
    pub data: Option<String>,
    #[serde(default = "default_image_mime")]
    #[schema(example = "image/png")]
    pub mime_type: String,
}

impl ImageInput {
    pub fn has_source(&self) -> bool {
        [&self.url, &self.s3_key, &self.data]
            .iter()
            .any(|source| source.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// Short description for log lines.
    pub fn describe(&self) -> &str {
        self.url
            .as_deref()
            .or(self.s3_key.as_deref())
            .unwrap_or("unknown")
    }
}

/// Request payload for image regeneration
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Images to regenerate
    pub images: Vec<ImageInput>,
    /// Renovation preferences and feedback
    #[schema(example = "Make the kitchen Scandinavian with light oak cabinets")]
    pub user_feedback: String,
    /// Property the images belong to; enables chat history
    pub property_id: Option<String>,
}
