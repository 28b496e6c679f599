//! Validation for image regeneration requests.

use crate::constants::{ERR_FEEDBACK_REQUIRED, ERR_IMAGE_REQUIRED, ERR_IMAGE_SOURCE_REQUIRED};
use crate::errors::ApiError;
use crate::models::ChatRequest;

/// Check a chat request before any image is fetched.
pub fn validate_chat_request(request: &ChatRequest) -> Result<(), ApiError> {
    if request.images.is_empty() {
        return Err(ApiError::BadRequest(ERR_IMAGE_REQUIRED.to_string()));
    }

    if request.user_feedback.trim().is_empty() {
        return Err(ApiError::BadRequest(ERR_FEEDBACK_REQUIRED.to_string()));
    }

    if !request.images.iter().any(|image| image.has_source()) {
        return Err(ApiError::BadRequest(ERR_IMAGE_SOURCE_REQUIRED.to_string()));
    }

    Ok(())
}
