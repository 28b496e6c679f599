//! Liveness endpoint.

use actix_web::HttpResponse;

use crate::constants::MSG_SERVER_RUNNING;
use crate::models::HealthResponse;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        message: MSG_SERVER_RUNNING.to_string(),
    })
}
