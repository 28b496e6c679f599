//! Reading PDF files out of multipart uploads.

use actix_multipart::Multipart;
use futures::StreamExt;
use log::{debug, warn};

use crate::constants::{ERR_FAILED_PROCESS_UPLOAD, ERR_FAILED_READ_FILE, ERR_FILES_REQUIRED};
use crate::errors::ApiError;
use crate::validators::{validate_pdf_filename, validate_pdf_size};

/// Multipart field carrying the uploaded documents.
pub const FILES_FIELD: &str = "files";

/// A PDF received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Collect every `files` part of a multipart payload.
///
/// Each part must be named `*.pdf` and stay under the upload size limit.
/// Other fields are skipped. An upload without any file is rejected.
pub async fn read_pdf_uploads(payload: &mut Multipart) -> Result<Vec<UploadedPdf>, ApiError> {
    let mut files = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            warn!("Failed to process multipart field: {}", e);
            ApiError::BadRequest(ERR_FAILED_PROCESS_UPLOAD.to_string())
        })?;

        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or("");
        if field_name != FILES_FIELD {
            continue;
        }

        let filename = content_disposition
            .and_then(|cd| cd.get_filename())
            .unwrap_or("")
            .to_string();
        validate_pdf_filename(&filename)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| {
                warn!("Failed to read chunk: {}", e);
                ApiError::BadRequest(ERR_FAILED_READ_FILE.to_string())
            })?;
            validate_pdf_size(bytes.len() + data.len())?;
            bytes.extend_from_slice(&data);
        }

        debug!("Received {} ({} bytes)", filename, bytes.len());
        files.push(UploadedPdf { filename, bytes });
    }

    if files.is_empty() {
        return Err(ApiError::Validation(ERR_FILES_REQUIRED.to_string()));
    }
    Ok(files)
}
