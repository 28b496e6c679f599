use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    ChatRequest, ChatResponse, ErrorResponse, ExtractedImage, HealthResponse, ImageInput,
    LoginRequest, MessageResponse, PdfUploadResponse, RegeneratedImage, RegisterRequest,
    TokenResponse, UserResponse,
};

/// OpenAPI documentation for the property analysis API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Property Analysis API",
        version = "1.0.0",
        description = "Authentication, photo extraction from PDF brochures and AI image regeneration."
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Registration, login, token refresh and logout"),
        (name = "Documents", description = "PDF upload and photo extraction"),
        (name = "Chat", description = "Image regeneration from renovation feedback")
    ),
    paths(
        crate::handlers::health_check,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::refresh,
        crate::handlers::logout,
        crate::handlers::upload_pdfs,
        crate::handlers::regenerate_images
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UserResponse,
            TokenResponse,
            MessageResponse,
            ExtractedImage,
            PdfUploadResponse,
            ImageInput,
            ChatRequest,
            RegeneratedImage,
            ChatResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// The OpenAPI document titled with the configured application name.
pub fn api_doc(app_name: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = app_name.to_string();
    doc
}

/// Security configuration for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from the /auth/login endpoint"))
                        .build(),
                ),
            );
        }
    }
}
