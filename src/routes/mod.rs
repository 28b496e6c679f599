use actix_governor::Governor;
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::middleware::rate_limiter::AuthRateLimiterConfig;
use crate::validators::{json_config, query_config};

/// Mount the API. Auth routes are rate limited when a limiter config is given.
pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_limiter: Option<AuthRateLimiterConfig>) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::resource("/health")
                .route(web::get().to(handlers::health_check))
                .default_service(web::to(handlers::method_not_allowed)),
        );

    match auth_limiter {
        Some(limiter) => cfg.service(auth_scope().wrap(Governor::new(&limiter))),
        None => cfg.service(auth_scope()),
    };

    cfg.service(
        web::scope("/doc").service(
            web::resource("/upload")
                .route(web::post().to(handlers::upload_pdfs))
                .default_service(web::to(handlers::method_not_allowed)),
        ),
    )
    .service(
        web::scope("/chat").service(
            web::resource("/chat")
                .route(web::post().to(handlers::regenerate_images))
                .default_service(web::to(handlers::method_not_allowed)),
        ),
    );
}

fn auth_scope() -> actix_web::Scope {
    web::scope("/auth")
        .service(
            web::resource("/register")
                .route(web::post().to(handlers::register))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/login")
                .route(web::post().to(handlers::login))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/refresh")
                .route(web::post().to(handlers::refresh))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/logout")
                .route(web::post().to(handlers::logout))
                .default_service(web::to(handlers::method_not_allowed)),
        )
}

/// Swagger UI at `/docs`, ReDoc at `/redoc`, the document at `/openapi.json`.
pub fn configure_docs(cfg: &mut web::ServiceConfig, openapi: utoipa::openapi::OpenApi) {
    cfg.service(web::resource("/docs").route(web::get().to(docs_redirect)))
        .service(Redoc::with_url("/redoc", openapi.clone()))
        .service(SwaggerUi::new("/docs/{_:.*}").url("/openapi.json", openapi));
}

async fn docs_redirect() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, "/docs/"))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE, SET_COOKIE};
    use actix_web::{test, App};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::config::Config;
    use crate::handlers::RefreshCookie;
    use crate::middleware::JwtAuth;
    use crate::services::generator::{GeneratedImage, ImageGenerator};
    use crate::services::storage::{MemoryStore, ObjectStore};
    use crate::services::{AuthService, ChatService, DocService, MongoService, TokenService};
    use crate::test_support::{png_bytes, sample_brochure_pdf, FakeGenerator};

    const BOUNDARY: &str = "brochure-boundary";

    fn tokens() -> TokenService {
        TokenService::new("test-secret", "HS256", 30)
    }

    fn bearer() -> String {
        let token = tokens().create_token("64b7f0c2a1b2c3d4e5f60718", "jane@example.com").unwrap();
        format!("Bearer {}", token)
    }

    fn build_app(
        store: Option<Arc<dyn ObjectStore>>,
        generator: Option<Arc<dyn ImageGenerator>>,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let config = Config::from_lookup(|_| None);
        let mongo = MongoService::disconnected(&config);
        App::new()
            .app_data(web::Data::new(AuthService::new(mongo.clone(), tokens(), 30)))
            .app_data(web::Data::new(DocService::new(store.clone())))
            .app_data(web::Data::new(ChatService::new(store, generator, mongo)))
            .app_data(web::Data::new(RefreshCookie::from_config(&config)))
            .wrap(JwtAuth::new(tokens()))
            .configure(|cfg| configure_routes(cfg, None))
            .configure(|cfg| configure_docs(cfg, crate::openapi::api_doc("Test API")))
            .default_service(web::to(handlers::not_found))
    }

    fn multipart(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (filename, bytes) in parts {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                    BOUNDARY, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    #[actix_web::test]
    async fn test_health_and_method_not_allowed() {
        let app = test::init_service(build_app(None, None)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "OK", "message": "Server is running"}));

        let req = test::TestRequest::delete().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 405);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Method DELETE not allowed for this endpoint");
    }

    #[actix_web::test]
    async fn test_unknown_path() {
        let app = test::init_service(build_app(None, None)).await;

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);

        let req = test::TestRequest::get()
            .uri("/nowhere")
            .insert_header((AUTHORIZATION, bearer()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "The requested resource was not found");
    }

    #[actix_web::test]
    async fn test_register_validation_and_database_errors() {
        let app = test::init_service(build_app(None, None)).await;

        let cases = [
            (json!({"email": "nope", "password": "secret123"}), 422, "email value is not a valid email address"),
            (json!({"email": "jane@example.com"}), 422, "password field required"),
            (json!({"email": "jane@example.com", "password": "secret123"}), 503, "Database service unavailable"),
        ];
        for (payload, status, message) in cases {
            let req = test::TestRequest::post()
                .uri("/auth/register")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), status, "{}", payload);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], message);
        }
    }

    #[actix_web::test]
    async fn test_refresh_without_cookie() {
        let app = test::init_service(build_app(None, None)).await;

        let req = test::TestRequest::post().uri("/auth/refresh").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Refresh token missing");
    }

    #[actix_web::test]
    async fn test_logout_clears_cookie() {
        let app = test::init_service(build_app(None, None)).await;

        let req = test::TestRequest::post().uri("/auth/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let cookie = resp
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("refresh_token="), "{}", cookie);
        assert!(cookie.contains("Path=/auth/refresh"), "{}", cookie);
        assert!(cookie.contains("Max-Age=0"), "{}", cookie);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"result": {"message": "Logged out successfully"}}));
    }

    #[actix_web::test]
    async fn test_upload_pdf_extracts_images() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let app = test::init_service(build_app(Some(store), None)).await;

        let pdf = sample_brochure_pdf();
        let req = test::TestRequest::post()
            .uri("/doc/upload")
            .insert_header((AUTHORIZATION, bearer()))
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart(&[("brochure.pdf", &pdf[..])]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let body: Value = test::read_body_json(resp).await;
        let result = &body["result"];
        assert_eq!(result["total_files"], 1);
        assert_eq!(result["total_pages"], 3);
        assert_eq!(result["total_images"], 2);
        assert_eq!(result["images"][0]["filename"], "brochure.pdf_page1_img1.png");
        assert_eq!(result["images"][0]["caption"], "Modern kitchen");
        assert_eq!(result["images"][0]["mime_type"], "image/png");
        assert_eq!(
            result["message"],
            "Successfully extracted 2 images from 1 PDF(s)"
        );
    }

    #[actix_web::test]
    async fn test_upload_rejects_non_pdf() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let app = test::init_service(build_app(Some(store), None)).await;

        let req = test::TestRequest::post()
            .uri("/doc/upload")
            .insert_header((AUTHORIZATION, bearer()))
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(multipart(&[("notes.txt", &b"hello"[..])]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Only PDF files are allowed. Got: notes.txt");
    }

    #[actix_web::test]
    async fn test_chat_regenerates_and_stores() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let generator: Arc<dyn ImageGenerator> = Arc::new(FakeGenerator::returning(
            vec![GeneratedImage::Inline {
                bytes: png_bytes(),
                mime_type: "image/png".to_string(),
            }],
            "Light oak cabinets",
        ));
        let app = test::init_service(build_app(Some(store), Some(generator))).await;

        let req = test::TestRequest::post()
            .uri("/chat/chat")
            .insert_header((AUTHORIZATION, bearer()))
            .set_json(json!({
                "images": [{"data": STANDARD.encode(png_bytes())}],
                "user_feedback": "Scandinavian kitchen",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let body: Value = test::read_body_json(resp).await;
        let result = &body["result"];
        assert_eq!(result["input_count"], 1);
        assert_eq!(result["description"], "Light oak cabinets");
        assert_eq!(result["message"], "Successfully regenerated 1 image(s)");
        let url = result["regenerated_images"][0]["url"].as_str().unwrap();
        assert!(url.starts_with("https://bucket.s3.eu-west-1.amazonaws.com/regenerated/"));
    }

    #[actix_web::test]
    async fn test_chat_accepts_large_inline_image() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("bucket", "eu-west-1"));
        let generator: Arc<dyn ImageGenerator> = Arc::new(FakeGenerator::returning(
            vec![GeneratedImage::Inline {
                bytes: png_bytes(),
                mime_type: "image/png".to_string(),
            }],
            "Bright living room",
        ));
        let app = test::init_service(build_app(Some(store), Some(generator))).await;

        // Well past actix's default 2MB JSON limit once encoded.
        let mut photo = png_bytes();
        photo.resize(photo.len() + 2_000_000, 0);
        let req = test::TestRequest::post()
            .uri("/chat/chat")
            .insert_header((AUTHORIZATION, bearer()))
            .set_json(json!({
                "images": [{"data": STANDARD.encode(&photo)}],
                "user_feedback": "Brighter walls",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["result"]["input_count"], 1);
    }

    #[actix_web::test]
    async fn test_chat_request_errors() {
        let app = test::init_service(build_app(None, None)).await;

        let cases = [
            (json!({"images": [], "user_feedback": "x"}), 400, "At least one image is required"),
            (json!({"images": [{"url": "https://x"}], "user_feedback": " "}), 400, "User feedback is required"),
            (json!({"images": [{"mime_type": "image/png"}], "user_feedback": "x"}), 400, "At least one image must have a URL or base64 data"),
            (json!({"images": [{"url": "https://x"}], "user_feedback": "x"}), 503, "Image generation service unavailable"),
            (json!({"user_feedback": "x"}), 422, "images field required"),
        ];
        for (payload, status, message) in cases {
            let req = test::TestRequest::post()
                .uri("/chat/chat")
                .insert_header((AUTHORIZATION, bearer()))
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), status, "{}", payload);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], message);
        }
    }

    #[actix_web::test]
    async fn test_openapi_document_is_public() {
        let app = test::init_service(build_app(None, None)).await;

        let req = test::TestRequest::get().uri("/openapi.json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["info"]["title"], "Test API");

        let req = test::TestRequest::get().uri("/docs").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 302);
    }
}
