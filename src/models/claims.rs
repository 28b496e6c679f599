//! JWT Claims model.

use serde::{Deserialize, Serialize};

/// Access token payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub user_id: String, // MongoDB ObjectId hex
    pub email: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}
