//! Helpers for handlers behind the JWT middleware.

use actix_web::HttpRequest;
use log::warn;

use crate::constants::ERR_AUTH_REQUIRED;
use crate::errors::ApiError;
use crate::models::Claims;

use super::RequestExt;

/// Claims of the caller, or 401 when the request reached a protected
/// handler without passing through [`JwtAuth`](super::JwtAuth).
pub fn require_auth(req: &HttpRequest) -> Result<Claims, ApiError> {
    match req.get_claims() {
        Some(claims) => Ok(claims),
        None => {
            warn!("No claims on request to {}", req.path());
            Err(ApiError::Unauthorized(ERR_AUTH_REQUIRED.to_string()))
        }
    }
}
