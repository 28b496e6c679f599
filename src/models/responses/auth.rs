//! Authentication response models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::TOKEN_TYPE_BEARER;
use crate::models::UserInDb;

/// Registered user, without credentials
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[schema(example = true)]
    pub is_active: bool,
}

impl From<UserInDb> for UserResponse {
    fn from(user: UserInDb) -> Self {
        Self {
            created_at: user.created_at_utc(),
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
        }
    }
}

/// Issued access token
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Opaque refresh token, also set as an HttpOnly cookie on login
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            refresh_token: None,
            expires_in: None,
        }
    }
}
