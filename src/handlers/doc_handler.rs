//! PDF brochure upload handler.

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::errors::ApiError;
use crate::middleware::require_auth;
use crate::models::ApiResponse;
use crate::services::file_service::read_pdf_uploads;
use crate::services::DocService;

/// Upload PDF brochures and extract their photos
///
/// Each file is stored under `pdfs/`, then every photo is re-encoded as PNG,
/// uploaded under `extracted/<file stem>/` and returned with its caption.
#[utoipa::path(
    post,
    path = "/doc/upload",
    tag = "Documents",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "One or more PDF files in `files` fields"),
    responses(
        (status = 200, description = "Images extracted", body = crate::models::PdfUploadResponse),
        (status = 400, description = "Only PDF files are allowed", body = crate::models::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::models::ErrorResponse),
        (status = 422, description = "No files provided", body = crate::models::ErrorResponse),
        (status = 503, description = "Storage service unavailable", body = crate::models::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_pdfs(
    req: HttpRequest,
    doc_service: web::Data<DocService>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let claims = require_auth(&req)?;

    let files = read_pdf_uploads(&mut payload).await?;
    info!("User {} uploaded {} PDF(s)", claims.user_id, files.len());

    let response = doc_service.process_uploads(files).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(response)))
}
