//! Validation for uploaded PDF files.

use crate::constants::ERR_PDF_TOO_LARGE;
use crate::errors::ApiError;

/// Maximum size of a single uploaded PDF (50MB).
pub const MAX_PDF_SIZE: usize = 50 * 1024 * 1024;

/// Reject anything whose name does not end in `.pdf` (case-sensitive).
pub fn validate_pdf_filename(filename: &str) -> Result<(), ApiError> {
    if filename.ends_with(".pdf") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Only PDF files are allowed. Got: {}",
            filename
        )))
    }
}

pub fn validate_pdf_size(size: usize) -> Result<(), ApiError> {
    if size > MAX_PDF_SIZE {
        return Err(ApiError::BadRequest(ERR_PDF_TOO_LARGE.to_string()));
    }
    Ok(())
}
