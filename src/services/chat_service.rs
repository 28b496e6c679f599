//! Image regeneration: load the input images, call the model, store the results.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use log::{error, info, warn};
use mongodb::bson::DateTime;
use std::sync::Arc;

use crate::constants::{msg_images_regenerated, ERR_GENERATOR_UNAVAILABLE, ERR_NO_VALID_IMAGES};
use crate::errors::ApiError;
use crate::models::{ChatExchange, ChatRequest, ChatResponse, ImageInput, RegeneratedImage};
use crate::services::generator::{GeneratedImage, ImageGenerator, InputImage};
use crate::services::mongo_service::MongoService;
use crate::services::prompts::render_regeneration_prompt;
use crate::services::storage::{key_from_url, upload_image, ObjectStore};
use crate::validators::validate_chat_request;

const REGENERATED_FOLDER: &str = "regenerated";

/// A regenerated image as kept after storage: an object URL, or the raw
/// bytes in base64 when the upload was not possible.
#[derive(Debug, Clone, PartialEq)]
enum StoredOutput {
    Url { url: String, mime_type: String },
    Data { data: String, mime_type: String },
}

/// Strip an optional `data:<mime>;base64,` prefix and decode.
///
/// Line wraps and other whitespace inside the payload are ignored.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, String> {
    let encoded = match data.split_once(',') {
        Some((_, encoded)) => encoded,
        None => data,
    };
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| format!("failed to decode base64: {}", e))
}

fn regeneration_failed(reason: &str) -> ApiError {
    ApiError::InternalServerError(format!("Image regeneration failed: {}", reason))
}

#[derive(Clone)]
pub struct ChatService {
    store: Option<Arc<dyn ObjectStore>>,
    generator: Option<Arc<dyn ImageGenerator>>,
    mongo: MongoService,
}

impl ChatService {
    pub fn new(
        store: Option<Arc<dyn ObjectStore>>,
        generator: Option<Arc<dyn ImageGenerator>>,
        mongo: MongoService,
    ) -> Self {
        Self {
            store,
            generator,
            mongo,
        }
    }

    /// Regenerate the request's images following the user's feedback.
    pub async fn regenerate(
        &self,
        request: ChatRequest,
        user_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        validate_chat_request(&request)?;

        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| ApiError::ServiceUnavailable(ERR_GENERATOR_UNAVAILABLE.to_string()))?;

        let sources: Vec<&ImageInput> = request
            .images
            .iter()
            .filter(|image| image.has_source())
            .collect();
        let input_count = sources.len();

        let mut inputs = Vec::with_capacity(input_count);
        for image in sources {
            match self.load_image(image).await {
                Ok(loaded) => inputs.push(loaded),
                Err(e) => warn!("Could not load image {}: {}", image.describe(), e),
            }
        }
        if inputs.is_empty() {
            return Err(regeneration_failed(ERR_NO_VALID_IMAGES));
        }

        let prompt = render_regeneration_prompt(&request.user_feedback);
        let output = generator.regenerate(&prompt, inputs).await.map_err(|e| {
            error!("Error regenerating images: {}", e);
            regeneration_failed(&e.to_string())
        })?;

        let mut stored = Vec::with_capacity(output.images.len());
        for image in output.images {
            stored.push(self.store_output(image, generator.output_name()).await);
        }
        info!("Generated {} images", stored.len());

        let regenerated_images: Vec<RegeneratedImage> = stored
            .into_iter()
            .filter_map(|output| match output {
                StoredOutput::Url { url, mime_type } => Some(RegeneratedImage { url, mime_type }),
                StoredOutput::Data { .. } => None,
            })
            .collect();

        if let Some(property_id) = request.property_id.as_deref().filter(|p| !p.is_empty()) {
            let exchange = ChatExchange {
                user_id: user_id.map(str::to_string),
                user_feedback: request.user_feedback.clone(),
                input_count: input_count as i64,
                regenerated_urls: regenerated_images.iter().map(|i| i.url.clone()).collect(),
                description: output.description.clone(),
                created_at: DateTime::now(),
            };
            self.record_history(property_id, &exchange).await;
        }

        Ok(ChatResponse {
            message: msg_images_regenerated(regenerated_images.len()),
            regenerated_images,
            description: output.description,
            input_count,
        })
    }

    /// Load one input, trying its url, then s3_key, then data.
    async fn load_image(&self, input: &ImageInput) -> Result<InputImage, String> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        let bytes = if let Some(url) = non_empty(&input.url) {
            self.fetch_url(&url).await?
        } else if let Some(key) = non_empty(&input.s3_key) {
            self.fetch_key(&key).await?
        } else if let Some(data) = non_empty(&input.data) {
            if data.starts_with("http://") || data.starts_with("https://") {
                self.fetch_url(&data).await?
            } else {
                decode_base64_image(&data)?
            }
        } else {
            return Err("no image source".to_string());
        };

        let format = image::guess_format(&bytes).map_err(|e| format!("not an image: {}", e))?;
        let mime_type = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            _ => input.mime_type.as_str(),
        };
        Ok(InputImage {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, String> {
        let key = key_from_url(url).ok_or_else(|| format!("not an S3 object URL: {}", url))?;
        self.fetch_key(&key).await
    }

    async fn fetch_key(&self, key: &str) -> Result<Vec<u8>, String> {
        let store = self
            .store
            .as_deref()
            .ok_or_else(|| "storage is not configured".to_string())?;
        store.get(key).await.map_err(|e| e.to_string())
    }

    async fn store_output(&self, image: GeneratedImage, filename: &str) -> StoredOutput {
        let (bytes, mime_type) = match image {
            GeneratedImage::Remote { url, mime_type } => {
                return StoredOutput::Url { url, mime_type };
            }
            GeneratedImage::Inline { bytes, mime_type } => (bytes, mime_type),
        };

        if let Some(store) = self.store.as_deref() {
            match upload_image(store, bytes.clone(), REGENERATED_FOLDER, filename, &mime_type).await
            {
                Ok(object) => {
                    return StoredOutput::Url {
                        url: object.url,
                        mime_type,
                    }
                }
                Err(e) => warn!("Upload of regenerated image failed: {}", e),
            }
        }

        StoredOutput::Data {
            data: STANDARD.encode(&bytes),
            mime_type,
        }
    }

    async fn record_history(&self, property_id: &str, exchange: &ChatExchange) {
        if !self.mongo.is_connected() {
            return;
        }
        let result = match self.mongo.chat_history() {
            Ok(history) => history.append(property_id, exchange).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("Failed to record chat history for {}: {}", property_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::storage::MemoryStore;
    use crate::test_support::{png_bytes, FakeGenerator};

    fn image(url: Option<&str>, s3_key: Option<&str>, data: Option<&str>) -> ImageInput {
        ImageInput {
            url: url.map(str::to_string),
            s3_key: s3_key.map(str::to_string),
            data: data.map(str::to_string),
            mime_type: "image/png".to_string(),
        }
    }

    fn request(images: Vec<ImageInput>) -> ChatRequest {
        ChatRequest {
            images,
            user_feedback: "Scandinavian kitchen".to_string(),
            property_id: None,
        }
    }

    fn service(
        store: Option<Arc<MemoryStore>>,
        generator: Option<Arc<FakeGenerator>>,
    ) -> ChatService {
        ChatService::new(
            store.map(|s| s as Arc<dyn ObjectStore>),
            generator.map(|g| g as Arc<dyn ImageGenerator>),
            MongoService::disconnected(&Config::from_lookup(|_| None)),
        )
    }

    fn inline_png() -> GeneratedImage {
        GeneratedImage::Inline {
            bytes: png_bytes(),
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn test_decode_base64_image() {
        let encoded = STANDARD.encode(b"abc");
        assert_eq!(decode_base64_image(&encoded).unwrap(), b"abc".to_vec());
        assert_eq!(
            decode_base64_image(&format!("data:image/png;base64,{}", encoded)).unwrap(),
            b"abc".to_vec()
        );
        assert!(decode_base64_image("%%%").is_err());

        let wrapped = STANDARD.encode(b"a longer payload wrapped across lines");
        let (head, tail) = wrapped.split_at(16);
        assert_eq!(
            decode_base64_image(&format!("{}\r\n{}\n", head, tail)).unwrap(),
            b"a longer payload wrapped across lines".to_vec()
        );
    }

    #[actix_web::test]
    async fn test_regenerates_from_stored_url() {
        let store = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let source = upload_image(store.as_ref(), png_bytes(), "extracted/b", "page1_img1", "image/png")
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::returning(vec![inline_png()], "A brighter kitchen"));
        let chat = service(Some(store.clone()), Some(generator.clone()));

        let response = chat
            .regenerate(request(vec![image(Some(&source.url), None, None)]), Some("u1"))
            .await
            .unwrap();

        assert_eq!(response.input_count, 1);
        assert_eq!(response.description, "A brighter kitchen");
        assert_eq!(response.message, "Successfully regenerated 1 image(s)");
        let key = key_from_url(&response.regenerated_images[0].url).unwrap();
        assert!(key.starts_with("regenerated/"));
        assert!(key.ends_with("_regen.png"));

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("Scandinavian kitchen"));
        assert_eq!(
            calls[0].1,
            vec![InputImage {
                bytes: png_bytes(),
                mime_type: "image/png".to_string(),
            }]
        );
    }

    #[actix_web::test]
    async fn test_source_priority_and_skipping() {
        let store = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        store
            .put("raw/photo.png", png_bytes(), "image/png")
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::returning(vec![], ""));
        let chat = service(Some(store), Some(generator.clone()));

        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        let response = chat
            .regenerate(
                request(vec![
                    image(None, Some("raw/photo.png"), None),
                    image(None, None, Some(&data_url)),
                    image(None, Some("raw/missing.png"), None),
                    image(None, None, None),
                ]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.input_count, 3);
        assert_eq!(response.message, "Successfully regenerated 0 image(s)");
        assert_eq!(generator.calls()[0].1.len(), 2);
    }

    #[actix_web::test]
    async fn test_no_loadable_images() {
        let generator = Arc::new(FakeGenerator::returning(vec![], ""));
        let chat = service(None, Some(generator.clone()));

        let err = chat
            .regenerate(request(vec![image(None, None, Some("bm90IGFuIGltYWdl"))]), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::InternalServerError(
                "Image regeneration failed: No valid images could be loaded".to_string()
            )
        );
        assert!(generator.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_generation_error_is_reported() {
        let generator = Arc::new(FakeGenerator::failing("boom"));
        let chat = service(None, Some(generator));
        let data = STANDARD.encode(png_bytes());

        let err = chat
            .regenerate(request(vec![image(None, None, Some(&data))]), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::InternalServerError(
                "Image regeneration failed: unexpected fake response: boom".to_string()
            )
        );
    }

    #[actix_web::test]
    async fn test_missing_generator_is_unavailable() {
        let chat = service(None, None);
        let data = STANDARD.encode(png_bytes());

        let err = chat
            .regenerate(request(vec![image(None, None, Some(&data))]), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::ServiceUnavailable(ERR_GENERATOR_UNAVAILABLE.to_string())
        );
    }

    #[actix_web::test]
    async fn test_outputs_without_storage_are_not_listed() {
        let remote = GeneratedImage::Remote {
            url: "https://cdn.example.com/out.png".to_string(),
            mime_type: "image/png".to_string(),
        };
        let generator = Arc::new(FakeGenerator::returning(vec![inline_png(), remote], ""));
        let chat = service(None, Some(generator));
        let data = STANDARD.encode(png_bytes());

        let response = chat
            .regenerate(request(vec![image(None, None, Some(&data))]), None)
            .await
            .unwrap();

        assert_eq!(response.regenerated_images.len(), 1);
        assert_eq!(
            response.regenerated_images[0].url,
            "https://cdn.example.com/out.png"
        );
    }

    #[actix_web::test]
    async fn test_store_output_falls_back_to_base64() {
        let chat = service(None, None);
        let stored = chat.store_output(inline_png(), "regen").await;
        assert_eq!(
            stored,
            StoredOutput::Data {
                data: STANDARD.encode(png_bytes()),
                mime_type: "image/png".to_string(),
            }
        );
    }
}
