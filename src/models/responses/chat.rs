//! Image regeneration response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A regenerated image stored in S3
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegeneratedImage {
    pub url: String,
    #[schema(example = "image/png")]
    pub mime_type: String,
}

/// Result of an image regeneration request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub regenerated_images: Vec<RegeneratedImage>,
    /// Text returned by the model
    pub description: String,
    pub input_count: usize,
    pub message: String,
}
