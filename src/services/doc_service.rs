//! PDF upload processing: store the brochure, extract its photos.

use log::{error, info};
use std::path::Path;
use std::sync::Arc;

use crate::constants::msg_images_extracted;
use crate::errors::ApiError;
use crate::models::PdfUploadResponse;
use crate::services::file_service::UploadedPdf;
use crate::services::pdf_extractor::{extract_images, ExtractionResult, DEFAULT_CAPTION_OFFSET};
use crate::services::storage::{ObjectStore, StorageError};

const PDF_MIME: &str = "application/pdf";

/// Extraction folder for a PDF: `extracted/<file stem>`.
pub fn extraction_folder(pdf_filename: &str) -> String {
    let stem = Path::new(pdf_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(pdf_filename);
    format!("extracted/{}", stem)
}

#[derive(Clone)]
pub struct DocService {
    store: Option<Arc<dyn ObjectStore>>,
}

impl DocService {
    pub fn new(store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> Result<&dyn ObjectStore, ApiError> {
        self.store
            .as_deref()
            .ok_or_else(|| StorageError::Unavailable.into())
    }

    /// Upload each PDF, read it back from storage and extract its photos.
    ///
    /// A file that fails at any step is logged and left out of the totals.
    pub async fn process_uploads(
        &self,
        files: Vec<UploadedPdf>,
    ) -> Result<PdfUploadResponse, ApiError> {
        let store = self.store()?;
        let total_files = files.len();
        let mut total_pages = 0usize;
        let mut images = Vec::new();

        for file in files {
            let result = match self.process_one(store, file).await {
                Ok(result) => result,
                Err((filename, message)) => {
                    error!("Failed to process {}: {}", filename, message);
                    continue;
                }
            };

            total_pages += result.total_pages as usize;
            for mut image in result.images {
                image.filename = format!("{}_{}", result.pdf_filename, image.filename);
                images.push(image);
            }
        }

        info!(
            "Extracted {} images from {} PDF(s)",
            images.len(),
            total_files
        );
        Ok(PdfUploadResponse {
            total_files,
            total_pages,
            total_images: images.len(),
            message: msg_images_extracted(images.len(), total_files),
            images,
        })
    }

    async fn process_one(
        &self,
        store: &dyn ObjectStore,
        file: UploadedPdf,
    ) -> Result<ExtractionResult, (String, String)> {
        let UploadedPdf { filename, bytes } = file;
        let key = format!("pdfs/{}", filename);

        store
            .put(&key, bytes, PDF_MIME)
            .await
            .map_err(|e| (filename.clone(), e.to_string()))?;
        info!("Uploaded PDF to S3: {}", key);

        let stored = store
            .get(&key)
            .await
            .map_err(|e| (filename.clone(), e.to_string()))?;

        extract_images(
            store,
            stored,
            &filename,
            &extraction_folder(&filename),
            DEFAULT_CAPTION_OFFSET,
        )
        .await
        .map_err(|e| (filename.clone(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ERR_STORAGE_UNAVAILABLE;
    use crate::services::storage::{key_from_url, MemoryStore};
    use crate::test_support::sample_brochure_pdf;

    fn upload(filename: &str, bytes: Vec<u8>) -> UploadedPdf {
        UploadedPdf {
            filename: filename.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_extraction_folder() {
        assert_eq!(extraction_folder("brochure.pdf"), "extracted/brochure");
        assert_eq!(extraction_folder("flat.2b.pdf"), "extracted/flat.2b");
    }

    #[actix_web::test]
    async fn test_process_uploads_extracts_and_prefixes() {
        let store = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let service = DocService::new(Some(store.clone() as Arc<dyn ObjectStore>));

        let response = service
            .process_uploads(vec![upload("brochure.pdf", sample_brochure_pdf())])
            .await
            .unwrap();

        assert_eq!(response.total_files, 1);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.total_images, 2);
        assert_eq!(response.message, "Successfully extracted 2 images from 1 PDF(s)");
        assert_eq!(response.images[0].filename, "brochure.pdf_page1_img1.png");
        assert_eq!(response.images[0].caption, "Modern kitchen");
        assert_eq!(response.images[1].filename, "brochure.pdf_page2_img1.png");

        assert_eq!(
            store.content_type("pdfs/brochure.pdf").as_deref(),
            Some(PDF_MIME)
        );
        let key = key_from_url(&response.images[1].url).unwrap();
        assert!(key.starts_with("extracted/brochure/"));
    }

    #[actix_web::test]
    async fn test_broken_pdf_is_skipped() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let service = DocService::new(Some(store));

        let response = service
            .process_uploads(vec![
                upload("broken.pdf", b"not a pdf".to_vec()),
                upload("brochure.pdf", sample_brochure_pdf()),
            ])
            .await
            .unwrap();

        assert_eq!(response.total_files, 2);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.total_images, 2);
        assert_eq!(response.message, "Successfully extracted 2 images from 2 PDF(s)");
    }

    #[actix_web::test]
    async fn test_missing_store_is_unavailable() {
        let service = DocService::new(None);
        let err = service
            .process_uploads(vec![upload("brochure.pdf", sample_brochure_pdf())])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::ServiceUnavailable(ERR_STORAGE_UNAVAILABLE.to_string())
        );
    }
}
