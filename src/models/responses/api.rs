//! Response envelopes shared by every endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Successful responses wrap their payload in `result`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub result: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Error response structure
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "The requested resource was not found")]
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Plain message payload
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out successfully")]
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status
    #[schema(example = "OK")]
    pub status: String,
    /// Status message
    #[schema(example = "Server is running")]
    pub message: String,
}
