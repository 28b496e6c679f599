//! Refresh token repository.
//!
//! Tokens are looked up by the SHA-256 hash of the opaque value; the value
//! itself is never stored.

use log::{debug, info};
use mongodb::bson::{doc, DateTime};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::errors::ApiError;
use crate::models::RefreshTokenRecord;

#[derive(Clone)]
pub struct RefreshTokenRepository {
    collection: Collection<RefreshTokenRecord>,
}

impl RefreshTokenRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    /// Unique index on `token_hash`.
    pub async fn create_indexes(&self) -> Result<(), ApiError> {
        let index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        info!("Token hash index verified on {}", self.collection.name());
        Ok(())
    }

    pub async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), ApiError> {
        self.collection.insert_one(record).await?;
        debug!("Stored refresh token for user: {}", record.user_id);
        Ok(())
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, ApiError> {
        Ok(self
            .collection
            .find_one(doc! { "token_hash": token_hash })
            .await?)
    }

    /// Mark a token revoked. Returns whether a stored token matched.
    pub async fn revoke(&self, token_hash: &str) -> Result<bool, ApiError> {
        let result = self
            .collection
            .update_one(
                doc! { "token_hash": token_hash },
                doc! { "$set": { "revoked": true, "revoked_at": DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
