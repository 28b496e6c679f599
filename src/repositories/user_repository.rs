//! User repository for MongoDB operations on the users collection.

use log::{debug, info};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::errors::ApiError;
use crate::models::UserInDb;

/// Repository for user documents.
#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<UserInDb>,
}

impl UserRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    /// Unique index on `email`.
    pub async fn create_indexes(&self) -> Result<(), ApiError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        info!("Email index verified on {}", self.collection.name());
        Ok(())
    }

    /// Insert a new user. Fails with a duplicate key error if the email exists.
    pub async fn insert(&self, user: &UserInDb) -> Result<Option<ObjectId>, mongodb::error::Error> {
        let result = self.collection.insert_one(user).await?;
        Ok(result.inserted_id.as_object_id())
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserInDb>, ApiError> {
        debug!("Repository: Finding user by ID: {}", id);
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserInDb>, ApiError> {
        Ok(self
            .collection
            .find_one(doc! { "email": email.to_lowercase() })
            .await?)
    }
}
