//! Chat history repository: one document per property holding every
//! regeneration exchange in `messages`.

use log::{debug, info};
use mongodb::bson::{doc, to_bson, DateTime, Document};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::errors::ApiError;
use crate::models::ChatExchange;

#[derive(Clone)]
pub struct ChatHistoryRepository {
    collection: Collection<Document>,
}

impl ChatHistoryRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    /// Unique index on `property_id`.
    pub async fn create_indexes(&self) -> Result<(), ApiError> {
        let index = IndexModel::builder()
            .keys(doc! { "property_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        info!("Property index verified on {}", self.collection.name());
        Ok(())
    }

    /// Append an exchange, creating the property's history on first use.
    pub async fn append(&self, property_id: &str, exchange: &ChatExchange) -> Result<(), ApiError> {
        let now = DateTime::now();
        self.collection
            .update_one(
                doc! { "property_id": property_id },
                doc! {
                    "$push": { "messages": to_bson(exchange)? },
                    "$set": { "updated_at": now },
                    "$setOnInsert": { "created_at": now },
                },
            )
            .upsert(true)
            .await?;

        debug!("Chat history updated for property: {}", property_id);
        Ok(())
    }
}
