mod config;
mod constants;
mod errors;
mod handlers;
mod middleware;
mod models;
mod openapi;
mod repositories;
mod routes;
mod services;
mod utils;
mod validators;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use std::sync::Arc;

use crate::config::{Config, CONFIG};
use crate::handlers::RefreshCookie;
use crate::middleware::{create_auth_rate_limiter_config, JwtAuth};
use crate::services::storage::{ObjectStore, S3Store};
use crate::services::{generator, AuthService, ChatService, DocService, MongoService, TokenService};

/// Request log line: `API: <METHOD> <path> | Status: <code> | Time: <ms>ms`.
const ACCESS_LOG_FORMAT: &str = "API: %{METHOD}xi %U | Status: %s | Time: %Dms";

fn cors(config: &Config) -> Cors {
    let mut cors = Cors::default()
        .allow_any_method()
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    match &config.cors_headers {
        Some(headers) => cors.allowed_headers(headers.iter().map(String::as_str)),
        None => cors.allow_any_header(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment variables and logger
    dotenv::dotenv().ok();
    env_logger::init_from_env(
        env_logger::Env::default().default_filter_or(CONFIG.log_level.to_lowercase()),
    );
    info!(
        "Starting {} ({} environment, debug: {})",
        CONFIG.app_name, CONFIG.environment, CONFIG.debug
    );

    // Backing services; each one may be missing
    let mongo = MongoService::connect(&CONFIG).await;
    let store: Option<Arc<dyn ObjectStore>> = S3Store::from_config(&CONFIG)
        .await
        .map(|store| Arc::new(store) as Arc<dyn ObjectStore>);
    let image_generator = generator::from_config(&CONFIG);

    let tokens = TokenService::new(
        &CONFIG.jwt_secret_key,
        &CONFIG.jwt_algorithm,
        CONFIG.access_token_expire_minutes,
    );
    let auth_service = web::Data::new(AuthService::new(
        mongo.clone(),
        tokens.clone(),
        CONFIG.refresh_token_expire_days,
    ));
    let doc_service = web::Data::new(DocService::new(store.clone()));
    let chat_service = web::Data::new(ChatService::new(store, image_generator, mongo));
    let refresh_cookie = web::Data::new(RefreshCookie::from_config(&CONFIG));

    let auth_limiter = create_auth_rate_limiter_config();
    if auth_limiter.is_none() {
        warn!("Auth rate limiter could not be configured - auth routes are not limited");
    }
    let openapi = openapi::api_doc(&CONFIG.app_name);

    let server_addr = CONFIG.bind_address();
    info!("Starting server at http://{}", server_addr);
    info!("API documentation at http://{}/docs", server_addr);

    HttpServer::new(move || {
        let auth_limiter = auth_limiter.clone();
        let openapi = openapi.clone();
        App::new()
            .app_data(auth_service.clone())
            .app_data(doc_service.clone())
            .app_data(chat_service.clone())
            .app_data(refresh_cookie.clone())
            .wrap(JwtAuth::new(tokens.clone()))
            .wrap(
                Logger::new(ACCESS_LOG_FORMAT)
                    .custom_request_replace("METHOD", |req| req.method().to_string()),
            )
            .wrap(cors(&CONFIG))
            .configure(|cfg| routes::configure_routes(cfg, auth_limiter))
            .configure(|cfg| routes::configure_docs(cfg, openapi))
            .default_service(web::to(handlers::not_found))
    })
    .bind(&server_addr)?
    .run()
    .await
}
