//! Fallback handlers for unknown routes and methods.

use actix_web::{HttpRequest, HttpResponse};

use crate::constants::ERR_NOT_FOUND;
use crate::errors::ApiError;

pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound(ERR_NOT_FOUND.to_string()))
}

pub async fn method_not_allowed(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed(format!(
        "Method {} not allowed for this endpoint",
        req.method()
    )))
}
