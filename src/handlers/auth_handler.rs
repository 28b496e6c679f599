//! Authentication handlers: registration, login, refresh-token rotation and logout.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::USER_AGENT;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{info, warn};

use crate::config::Config;
use crate::constants::{MSG_LOGGED_OUT, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH};
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, LoginQuery, LoginRequest, MessageResponse, RegisterRequest, TokenResponse,
};
use crate::services::AuthService;
use crate::utils::mask_email;
use crate::validators::validate_body;

/// Attributes of the refresh-token cookie.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub secure: bool,
    pub max_age_days: i64,
}

impl RefreshCookie {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.is_production(),
            max_age_days: config.refresh_token_expire_days,
        }
    }

    fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE_NAME, token)
            .path(REFRESH_COOKIE_PATH)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::days(self.max_age_days))
            .finish()
    }

    fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(REFRESH_COOKIE_NAME, "")
            .path(REFRESH_COOKIE_PATH)
            .finish();
        cookie.make_removal();
        cookie
    }
}

fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = crate::models::UserResponse),
        (status = 400, description = "Email already registered", body = crate::models::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 503, description = "Database service unavailable", body = crate::models::ErrorResponse)
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;

    let user = auth_service.register(body.into_inner()).await?;
    info!("User registered: {}", mask_email(&user.email));

    Ok(HttpResponse::Created().json(ApiResponse::new(user)))
}

/// Authenticate and receive an access token plus a refresh-token cookie
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    params(LoginQuery),
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid email or password", body = crate::models::ErrorResponse),
        (status = 403, description = "Account is inactive", body = crate::models::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::models::ErrorResponse)
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
    query: web::Query<LoginQuery>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;

    let issued = auth_service
        .login(body.into_inner(), query.into_inner().user_agent)
        .await?;

    let response = TokenResponse {
        refresh_token: Some(issued.refresh_token.clone()),
        expires_in: Some(auth_service.tokens().expires_in_seconds()),
        ..TokenResponse::bearer(issued.access_token)
    };

    Ok(HttpResponse::Ok()
        .cookie(cookie.issue(issued.refresh_token))
        .json(ApiResponse::new(response)))
}

/// Rotate the refresh token from the cookie and issue a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Refresh token missing, invalid, revoked or expired", body = crate::models::ErrorResponse)
    )
)]
pub async fn refresh(
    req: HttpRequest,
    auth_service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, ApiError> {
    let presented = req.cookie(REFRESH_COOKIE_NAME);
    let presented = presented.as_ref().map(|c| c.value());

    match auth_service.refresh(presented, user_agent(&req)).await {
        Ok(issued) => Ok(HttpResponse::Ok()
            .cookie(cookie.issue(issued.refresh_token))
            .json(ApiResponse::new(TokenResponse::bearer(issued.access_token)))),
        Err(failure) if failure.clear_cookie => {
            let mut response = failure.error.error_response();
            if let Err(e) = response.add_removal_cookie(&cookie.removal()) {
                warn!("Failed to clear refresh cookie: {}", e);
            }
            Ok(response)
        }
        Err(failure) => Err(failure.error),
    }
}

/// Revoke the refresh token from the cookie and clear it
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    )
)]
pub async fn logout(
    req: HttpRequest,
    auth_service: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> HttpResponse {
    let presented = req.cookie(REFRESH_COOKIE_NAME);
    auth_service
        .logout(presented.as_ref().map(|c| c.value()))
        .await;

    HttpResponse::Ok()
        .cookie(cookie.removal())
        .json(ApiResponse::new(MessageResponse {
            message: MSG_LOGGED_OUT.to_string(),
        }))
}
