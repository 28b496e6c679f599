//! MongoDB connection and collection setup.

use log::{error, info, warn};
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::config::Config;
use crate::constants::ERR_DATABASE_UNAVAILABLE;
use crate::errors::ApiError;
use crate::repositories::{ChatHistoryRepository, RefreshTokenRepository, UserRepository};

#[derive(Debug, Clone)]
struct CollectionNames {
    users: String,
    properties: String,
    chat_history: String,
    refresh_tokens: String,
}

/// Database handle shared by the handlers.
///
/// A service without a database keeps the API up; operations needing
/// persistence answer 503 instead.
#[derive(Clone)]
pub struct MongoService {
    db: Option<Database>,
    names: CollectionNames,
}

impl MongoService {
    pub fn disconnected(config: &Config) -> Self {
        Self {
            db: None,
            names: CollectionNames {
                users: config.mongodb_user_collection.clone(),
                properties: config.mongodb_property_collection.clone(),
                chat_history: config.mongodb_chat_collection.clone(),
                refresh_tokens: config.mongodb_refresh_token_collection.clone(),
            },
        }
    }

    /// Connect, ping and prepare collections. Never fails; connection
    /// problems are logged and leave the service disconnected.
    pub async fn connect(config: &Config) -> Self {
        let mut service = Self::disconnected(config);

        if config.mongodb_uri.is_empty() {
            warn!("MONGODB_URI not configured - MongoDB operations will fail");
            return service;
        }

        let db = match Self::open(&config.mongodb_uri, &config.mongodb_db_name).await {
            Ok(db) => db,
            Err(e) => {
                error!("Failed to connect to MongoDB: {}", e);
                return service;
            }
        };
        info!("MongoDB connection successful");

        service.db = Some(db);
        service.ensure_indexes().await;
        info!("MongoDB ready: {}", config.mongodb_db_name);
        service
    }

    async fn open(uri: &str, db_name: &str) -> Result<Database, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 }).await?;
        Ok(db)
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    fn database(&self) -> Result<&Database, ApiError> {
        self.db
            .as_ref()
            .ok_or_else(|| ApiError::ServiceUnavailable(ERR_DATABASE_UNAVAILABLE.to_string()))
    }

    pub fn users(&self) -> Result<UserRepository, ApiError> {
        Ok(UserRepository::new(self.database()?, &self.names.users))
    }

    pub fn refresh_tokens(&self) -> Result<RefreshTokenRepository, ApiError> {
        Ok(RefreshTokenRepository::new(
            self.database()?,
            &self.names.refresh_tokens,
        ))
    }

    pub fn chat_history(&self) -> Result<ChatHistoryRepository, ApiError> {
        Ok(ChatHistoryRepository::new(
            self.database()?,
            &self.names.chat_history,
        ))
    }

    async fn ensure_collection(&self, db: &Database, name: &str) {
        match db.list_collection_names().await {
            Ok(existing) if existing.iter().any(|c| c == name) => {}
            Ok(_) => match db.create_collection(name).await {
                Ok(()) => info!("Created collection: {}", name),
                Err(e) => error!("Error creating collection {}: {}", name, e),
            },
            Err(e) => error!("Error ensuring collection {} exists: {}", name, e),
        }
    }

    async fn ensure_indexes(&self) {
        let Some(db) = self.db.as_ref() else {
            return;
        };

        for name in [
            &self.names.users,
            &self.names.properties,
            &self.names.chat_history,
            &self.names.refresh_tokens,
        ] {
            self.ensure_collection(db, name).await;
        }

        if let Err(e) = UserRepository::new(db, &self.names.users)
            .create_indexes()
            .await
        {
            error!("Error creating user indexes: {}", e);
        }

        let properties = db.collection::<Document>(&self.names.properties);
        let property_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "property_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "user_id": 1 }).build(),
        ];
        if let Err(e) = properties.create_indexes(property_indexes).await {
            error!("Error creating property indexes: {}", e);
        }

        if let Err(e) = ChatHistoryRepository::new(db, &self.names.chat_history)
            .create_indexes()
            .await
        {
            error!("Error creating chat history indexes: {}", e);
        }

        if let Err(e) = RefreshTokenRepository::new(db, &self.names.refresh_tokens)
            .create_indexes()
            .await
        {
            error!("Error creating refresh token indexes: {}", e);
        }

        info!("MongoDB indexes verified for all collections");
    }
}
