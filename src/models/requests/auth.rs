//! Authentication request models.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request payload for user registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User's email address
    #[validate(email(message = "value is not a valid email address"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (minimum 6 characters)
    #[validate(length(min = 6, message = "String should have at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
    /// Optional display name
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,
}

/// Request payload for user login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "value is not a valid email address"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[validate(length(min = 6, message = "String should have at least 6 characters"))]
    #[schema(example = "secret123")]
    pub password: String,
}

/// Optional login query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LoginQuery {
    /// Client description stored with the refresh token
    pub user_agent: Option<String>,
}
