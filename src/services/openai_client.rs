//! OpenAI image edits over the REST API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::constants::MSG_DESCRIPTION_OPENAI;
use crate::services::generator::{
    GeneratedImage, GeneratedOutput, GenerationError, ImageGenerator, InputImage,
};

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const OUTPUT_MIME: &str = "image/png";
const INPUT_FILENAME: &str = "input_image.png";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

impl OpenAiClient {
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

    fn form(&self, prompt: &str, images: Vec<InputImage>) -> Result<Form, GenerationError> {
        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", prompt.to_string());

        for image in images {
            let part = Part::bytes(image.bytes)
                .file_name(INPUT_FILENAME)
                .mime_str(&image.mime_type)
                .map_err(|e| GenerationError::Request {
                    provider: PROVIDER,
                    message: e.to_string(),
                })?;
            form = form.part("image[]", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn regenerate(
        &self,
        prompt: &str,
        images: Vec<InputImage>,
    ) -> Result<GeneratedOutput, GenerationError> {
        info!("Sending {} images to OpenAI ({})", images.len(), self.model);

        let response = self
            .client
            .post(format!("{}/v1/images/edits", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(self.form(prompt, images)?)
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error {}: {}", status, body);
            return Err(GenerationError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let payload: ImagesResponse =
            response.json().await.map_err(|e| GenerationError::Response {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let mut generated = Vec::new();
        for item in payload.data {
            if let Some(b64) = item.b64_json.filter(|b| !b.is_empty()) {
                let bytes = STANDARD
                    .decode(b64.as_bytes())
                    .map_err(|e| GenerationError::Response {
                        provider: PROVIDER,
                        message: format!("invalid b64_json: {}", e),
                    })?;
                generated.push(GeneratedImage::Inline {
                    bytes,
                    mime_type: OUTPUT_MIME.to_string(),
                });
            } else if let Some(url) = item.url.filter(|u| !u.is_empty()) {
                generated.push(GeneratedImage::Remote {
                    url,
                    mime_type: OUTPUT_MIME.to_string(),
                });
            }
        }

        info!("OpenAI generated {} images", generated.len());
        Ok(GeneratedOutput {
            images: generated,
            description: MSG_DESCRIPTION_OPENAI.to_string(),
        })
    }

    fn output_name(&self) -> &'static str {
        "openai_regen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_regenerate_decodes_b64_and_keeps_urls() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/images/edits")
                    .header("authorization", "Bearer sk-test")
                    .body_contains("name=\"model\"")
                    .body_contains("gpt-image-test")
                    .body_contains("name=\"image[]\"; filename=\"input_image.png\"");
                then.status(200).json_body(json!({
                    "data": [
                        { "b64_json": "AQID" },
                        { "url": "https://cdn.example.com/out.png" },
                        { }
                    ]
                }));
            })
            .await;

        let client = OpenAiClient::new("sk-test", "gpt-image-test").with_base_url(&server.base_url());
        let output = client
            .regenerate(
                "prompt",
                vec![InputImage {
                    bytes: vec![9, 9],
                    mime_type: "image/png".to_string(),
                }],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(output.description, MSG_DESCRIPTION_OPENAI);
        assert_eq!(
            output.images,
            vec![
                GeneratedImage::Inline {
                    bytes: vec![1, 2, 3],
                    mime_type: "image/png".to_string()
                },
                GeneratedImage::Remote {
                    url: "https://cdn.example.com/out.png".to_string(),
                    mime_type: "image/png".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_regenerate_reports_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/images/edits");
                then.status(400).body("bad image");
            })
            .await;

        let client = OpenAiClient::new("sk-test", "m").with_base_url(&server.base_url());
        let err = client.regenerate("prompt", Vec::new()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 400, .. }));
    }
}
