//! Google Gemini image generation over the REST API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::services::generator::{
    GeneratedImage, GeneratedOutput, GenerationError, ImageGenerator, InputImage,
};

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MIME: &str = "image/png";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: Option<String>,
    data: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(prompt: &str, images: &[InputImage]) -> serde_json::Value {
        let mut parts = vec![json!({ "text": prompt })];
        parts.extend(images.iter().map(|image| {
            json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": STANDARD.encode(&image.bytes),
                }
            })
        }));

        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn regenerate(
        &self,
        prompt: &str,
        images: Vec<InputImage>,
    ) -> Result<GeneratedOutput, GenerationError> {
        debug!("Sending {} images to Gemini ({})", images.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, &images))
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, body);
            return Err(GenerationError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse =
            response.json().await.map_err(|e| GenerationError::Response {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let mut output = GeneratedOutput::default();
        let parts = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(text) = part.text {
                output.description.push_str(&text);
            } else if let Some(inline) = part.inline_data {
                let bytes = STANDARD
                    .decode(inline.data.as_bytes())
                    .map_err(|e| GenerationError::Response {
                        provider: PROVIDER,
                        message: format!("invalid inline image data: {}", e),
                    })?;
                output.images.push(GeneratedImage::Inline {
                    bytes,
                    mime_type: inline.mime_type.unwrap_or_else(|| DEFAULT_MIME.to_string()),
                });
            }
        }

        info!("Generated {} images", output.images.len());
        Ok(output)
    }
}
