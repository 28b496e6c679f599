//! Documents stored in MongoDB.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// User document in the users collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInDb {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub hashed_password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub created_at: mongodb::bson::DateTime,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl UserInDb {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.created_at.timestamp_millis()).unwrap_or_default()
    }
}

/// Issued refresh token. Only the SHA-256 hash of the opaque token is kept.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshTokenRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub token_hash: String,
    pub created_at: mongodb::bson::DateTime,
    pub expires_at: mongodb::bson::DateTime,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: mongodb::bson::DateTime) -> bool {
        self.expires_at < now
    }
}

/// One image regeneration round, appended to a property's chat history.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatExchange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_feedback: String,
    pub input_count: i64,
    pub regenerated_urls: Vec<String>,
    pub description: String,
    pub created_at: mongodb::bson::DateTime,
}
