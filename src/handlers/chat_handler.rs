//! Image regeneration handler.

use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::errors::ApiError;
use crate::middleware::require_auth;
use crate::models::{ApiResponse, ChatRequest};
use crate::services::ChatService;

/// Regenerate property photos from renovation feedback
///
/// Images may be given as S3 object URLs (as returned by `/doc/upload`), S3
/// keys or base64 data. Regenerated images are stored under `regenerated/`.
#[utoipa::path(
    post,
    path = "/chat/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Images regenerated", body = crate::models::ChatResponse),
        (status = 400, description = "Missing images or feedback", body = crate::models::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::models::ErrorResponse),
        (status = 500, description = "Image regeneration failed", body = crate::models::ErrorResponse),
        (status = 503, description = "Image generation service unavailable", body = crate::models::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn regenerate_images(
    req: HttpRequest,
    chat_service: web::Data<ChatService>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = require_auth(&req)?;
    info!(
        "Regenerating {} image(s) for user {}",
        body.images.len(),
        claims.user_id
    );

    let response = chat_service
        .regenerate(body.into_inner(), Some(&claims.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(response)))
}
