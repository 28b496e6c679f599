//! Object storage for uploaded PDFs and generated images.
//!
//! Production uses S3; tests and local runs without credentials can use the
//! in-memory store. Both hand out public object URLs of the form
//! `https://<bucket>.s3.<region>.amazonaws.com/<key>`.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

const S3_HOST_MARKER: &str = ".amazonaws.com/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not configured")]
    Unavailable,
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage request failed for {key}: {message}")]
    Backend { key: String, message: String },
}

/// An uploaded object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub bucket: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn bucket(&self) -> &str;

    fn region(&self) -> &str;

    fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket(),
            self.region(),
            key
        )
    }
}

/// Unique object key: `<folder>/<8 hex chars>_<filename>.<extension>`.
pub fn generate_key(folder: &str, filename: &str, extension: &str) -> String {
    let unique_id = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}.{}",
        folder.trim_matches('/'),
        &unique_id[..8],
        filename,
        extension
    )
}

/// File extension for an image MIME type, PNG when unknown.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Recover the object key from a public S3 object URL.
pub fn key_from_url(url: &str) -> Option<String> {
    let (_, key) = url.split_once(S3_HOST_MARKER)?;
    let key = key.split('?').next().unwrap_or_default();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Upload image bytes under a freshly generated key.
pub async fn upload_image(
    store: &dyn ObjectStore,
    bytes: Vec<u8>,
    folder: &str,
    filename: &str,
    mime_type: &str,
) -> Result<StoredObject, StorageError> {
    let key = generate_key(folder, filename, extension_for_mime(mime_type));
    store.put(&key, bytes, mime_type).await?;
    Ok(StoredObject {
        url: store.public_url(&key),
        bucket: store.bucket().to_string(),
        key,
    })
}

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    /// Build a store from the AWS settings, or `None` when they are incomplete.
    pub async fn from_config(config: &Config) -> Option<Self> {
        if config.aws_access_key_id.is_empty() || config.aws_secret_access_key.is_empty() {
            warn!("AWS credentials not configured - S3 operations will fail");
            return None;
        }
        if config.aws_bucket_name.is_empty() {
            warn!("AWS_BUCKET_NAME not configured");
            return None;
        }

        let credentials = Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "environment",
        );
        let sdk_config = aws_config::from_env()
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config).build();

        info!(
            "S3 service initialized for bucket: {} in {}",
            config.aws_bucket_name, config.aws_region
        );
        Some(Self::new(
            S3Client::from_conf(s3_config),
            config.aws_bucket_name.clone(),
            config.aws_region.clone(),
        ))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!("S3 upload error for {}: {}", key, DisplayErrorContext(&e));
                StorageError::Backend {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        debug!("Uploaded to S3: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    error!("S3 object not found: {}", key);
                    return StorageError::NotFound(key.to_string());
                }
                error!("S3 download error for {}: {}", key, DisplayErrorContext(&e));
                StorageError::Backend {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn region(&self) -> &str {
        &self.region
    }
}

/// In-process object store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    region: String,
    objects: DashMap<String, (Vec<u8>, String)>,
}

impl MemoryStore {
    pub fn new(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|entry| entry.1.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(key)
            .map(|entry| entry.0.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn region(&self) -> &str {
        &self.region
    }
}
