//! Document upload response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An image extracted from an uploaded PDF
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractedImage {
    #[schema(example = "brochure.pdf_page1_img1.png")]
    pub filename: String,
    /// 1-based page number
    #[schema(example = 1)]
    pub page: u32,
    /// Text found just below the image
    #[schema(example = "Open plan kitchen")]
    pub caption: String,
    /// Public S3 object URL
    pub url: String,
    #[schema(example = "image/png")]
    pub mime_type: String,
}

/// Result of a PDF upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PdfUploadResponse {
    pub total_files: usize,
    pub total_pages: usize,
    pub total_images: usize,
    pub images: Vec<ExtractedImage>,
    pub message: String,
}
