//! Image generation providers.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, ImageProvider};
use crate::services::gemini_client::GeminiClient;
use crate::services::openai_client::OpenAiClient;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {provider} failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected {provider} response: {message}")]
    Response {
        provider: &'static str,
        message: String,
    },
}

/// An image handed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct InputImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// An image returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedImage {
    Inline { bytes: Vec<u8>, mime_type: String },
    Remote { url: String, mime_type: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedOutput {
    pub images: Vec<GeneratedImage>,
    pub description: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn regenerate(
        &self,
        prompt: &str,
        images: Vec<InputImage>,
    ) -> Result<GeneratedOutput, GenerationError>;

    /// Base filename used when storing this provider's images.
    fn output_name(&self) -> &'static str {
        "regen"
    }
}

/// Build the generator selected by `IMAGE_PROVIDER`, or `None` when its key is missing.
pub fn from_config(config: &Config) -> Option<Arc<dyn ImageGenerator>> {
    match config.image_provider {
        ImageProvider::Gemini if config.gemini_api_key.is_empty() => {
            warn!("GEMINI_API_KEY not configured - image regeneration disabled");
            None
        }
        ImageProvider::Gemini => {
            info!("Gemini client initialized with model: {}", config.gemini_model);
            Some(Arc::new(GeminiClient::new(
                &config.gemini_api_key,
                &config.gemini_model,
            )))
        }
        ImageProvider::OpenAi if config.openai_api_key.is_empty() => {
            warn!("OPENAI_API_KEY not configured - image regeneration disabled");
            None
        }
        ImageProvider::OpenAi => {
            info!("OpenAI client initialized with model: {}", config.openai_model);
            Some(Arc::new(OpenAiClient::new(
                &config.openai_api_key,
                &config.openai_model,
            )))
        }
    }
}
