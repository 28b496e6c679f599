//! Registration, login and refresh token rotation.

use chrono::Duration;
use log::{debug, error, info, warn};
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::constants::{
    ERR_ACCOUNT_INACTIVE, ERR_EMAIL_EXISTS, ERR_INVALID_CREDENTIALS, ERR_LOGIN_FAILED,
    ERR_REFRESH_EXPIRED, ERR_REFRESH_FAILED, ERR_REFRESH_INVALID, ERR_REFRESH_MISSING,
    ERR_REFRESH_REVOKED, ERR_REGISTRATION_FAILED, ERR_USER_NOT_FOUND,
};
use crate::errors::{is_duplicate_key, ApiError};
use crate::models::{LoginRequest, RefreshTokenRecord, RegisterRequest, UserInDb, UserResponse};
use crate::repositories::RefreshTokenRepository;
use crate::services::mongo_service::MongoService;
use crate::services::security::{generate_opaque_token, hash_password, token_hash, verify_password};
use crate::services::token_service::TokenService;
use crate::utils::{mask_email, mask_token};

/// Tokens handed out by login and refresh.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// A failed refresh. When `clear_cookie` is set the presented token is
/// unusable and the client should drop it.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshError {
    pub error: ApiError,
    pub clear_cookie: bool,
}

impl RefreshError {
    fn keep_cookie(error: ApiError) -> Self {
        Self {
            error,
            clear_cookie: false,
        }
    }

    fn clear_cookie(error: ApiError) -> Self {
        Self {
            error,
            clear_cookie: true,
        }
    }
}

/// Replace internal error detail with a generic message after logging it.
fn conceal(context: &'static str) -> impl Fn(ApiError) -> ApiError {
    move |err| match err {
        ApiError::InternalServerError(detail) => {
            error!("{}: {}", context, detail);
            ApiError::InternalServerError(context.to_string())
        }
        other => other,
    }
}

/// Decide whether a stored refresh token may be rotated.
pub fn check_refresh_record(
    record: Option<RefreshTokenRecord>,
    now: DateTime,
) -> Result<RefreshTokenRecord, ApiError> {
    let record = record.ok_or_else(|| {
        warn!("Attempted to use unknown refresh token");
        ApiError::Unauthorized(ERR_REFRESH_INVALID.to_string())
    })?;

    if record.revoked {
        warn!("Attempted to use revoked token for user: {}", record.user_id);
        return Err(ApiError::Unauthorized(ERR_REFRESH_REVOKED.to_string()));
    }
    if record.is_expired_at(now) {
        return Err(ApiError::Unauthorized(ERR_REFRESH_EXPIRED.to_string()));
    }
    Ok(record)
}

/// Service for authentication operations.
pub struct AuthService {
    mongo: MongoService,
    tokens: TokenService,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(mongo: MongoService, tokens: TokenService, refresh_token_days: i64) -> Self {
        Self {
            mongo,
            tokens,
            refresh_ttl: Duration::days(refresh_token_days),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user.
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, ApiError> {
        self.create_user(req)
            .await
            .map_err(conceal(ERR_REGISTRATION_FAILED))
    }

    async fn create_user(&self, req: RegisterRequest) -> Result<UserResponse, ApiError> {
        let users = self.mongo.users()?;
        let email = req.email.trim().to_lowercase();
        info!("Received registration request for email: {}", mask_email(&email));

        if users.find_by_email(&email).await?.is_some() {
            info!("User already exists: {}", mask_email(&email));
            return Err(ApiError::BadRequest(ERR_EMAIL_EXISTS.to_string()));
        }

        let mut user = UserInDb {
            id: None,
            email,
            hashed_password: hash_password(&req.password)?,
            full_name: req.full_name,
            created_at: DateTime::now(),
            is_active: true,
        };

        match users.insert(&user).await {
            Ok(id) => {
                user.id = id;
                info!("User registered: {}", mask_email(&user.email));
                Ok(UserResponse::from(user))
            }
            Err(e) if is_duplicate_key(&e) => {
                Err(ApiError::BadRequest(ERR_EMAIL_EXISTS.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue an access token plus a stored refresh token.
    pub async fn login(
        &self,
        req: LoginRequest,
        user_agent: Option<String>,
    ) -> Result<IssuedTokens, ApiError> {
        self.authenticate(req, user_agent)
            .await
            .map_err(conceal(ERR_LOGIN_FAILED))
    }

    async fn authenticate(
        &self,
        req: LoginRequest,
        user_agent: Option<String>,
    ) -> Result<IssuedTokens, ApiError> {
        let users = self.mongo.users()?;
        let refresh_tokens = self.mongo.refresh_tokens()?;

        let user = users
            .find_by_email(req.email.trim())
            .await?
            .ok_or_else(|| ApiError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&req.password, &user.hashed_password)? {
            info!("Failed login for: {}", mask_email(&user.email));
            return Err(ApiError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            return Err(ApiError::Forbidden(ERR_ACCOUNT_INACTIVE.to_string()));
        }

        let user_id = user.id_hex();
        let access_token = self.tokens.create_token(&user_id, &user.email)?;
        let refresh_token = self
            .issue_refresh_token(&refresh_tokens, &user_id, user_agent)
            .await?;

        info!("User logged in: {}", mask_email(&user.email));
        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    async fn issue_refresh_token(
        &self,
        repository: &RefreshTokenRepository,
        user_id: &str,
        user_agent: Option<String>,
    ) -> Result<String, ApiError> {
        let token = generate_opaque_token();
        let now = DateTime::now();
        let record = RefreshTokenRecord {
            id: None,
            user_id: user_id.to_string(),
            token_hash: token_hash(&token),
            created_at: now,
            expires_at: DateTime::from_millis(
                now.timestamp_millis() + self.refresh_ttl.num_milliseconds(),
            ),
            revoked: false,
            user_agent,
        };

        repository.insert(&record).await?;
        Ok(token)
    }

    /// Rotate a refresh token: revoke the presented one and issue a new pair.
    pub async fn refresh(
        &self,
        presented: Option<&str>,
        user_agent: Option<String>,
    ) -> Result<IssuedTokens, RefreshError> {
        let token = match presented {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(RefreshError::keep_cookie(ApiError::Unauthorized(
                    ERR_REFRESH_MISSING.to_string(),
                )))
            }
        };

        let hide = conceal(ERR_REFRESH_FAILED);
        let failed = |e: ApiError| RefreshError::keep_cookie(hide(e));

        let refresh_tokens = self.mongo.refresh_tokens().map_err(&failed)?;
        let users = self.mongo.users().map_err(&failed)?;

        let hash = token_hash(token);
        let stored = refresh_tokens.find_by_hash(&hash).await.map_err(&failed)?;
        let record =
            check_refresh_record(stored, DateTime::now()).map_err(RefreshError::clear_cookie)?;

        refresh_tokens.revoke(&hash).await.map_err(&failed)?;
        debug!("Rotated refresh token {}", mask_token(token));

        let user = match ObjectId::parse_str(&record.user_id) {
            Ok(id) => users.find_by_id(id).await.map_err(&failed)?,
            Err(_) => None,
        }
        .ok_or_else(|| {
            RefreshError::keep_cookie(ApiError::Unauthorized(ERR_USER_NOT_FOUND.to_string()))
        })?;

        let access_token = self
            .tokens
            .create_token(&user.id_hex(), &user.email)
            .map_err(&failed)?;
        let refresh_token = self
            .issue_refresh_token(&refresh_tokens, &record.user_id, user_agent)
            .await
            .map_err(&failed)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Revoke the presented refresh token. Failures are ignored.
    pub async fn logout(&self, presented: Option<&str>) {
        let Some(token) = presented.filter(|t| !t.is_empty()) else {
            return;
        };

        match self.mongo.refresh_tokens() {
            Ok(repository) => {
                if let Err(e) = repository.revoke(&token_hash(token)).await {
                    debug!("Ignoring logout revoke failure: {}", e);
                }
            }
            Err(e) => debug!("Ignoring logout revoke failure: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::constants::ERR_DATABASE_UNAVAILABLE;

    fn record(revoked: bool, expires_in_ms: i64) -> RefreshTokenRecord {
        let now = DateTime::now();
        RefreshTokenRecord {
            id: None,
            user_id: ObjectId::new().to_hex(),
            token_hash: token_hash("token"),
            created_at: now,
            expires_at: DateTime::from_millis(now.timestamp_millis() + expires_in_ms),
            revoked,
            user_agent: None,
        }
    }

    fn disconnected_service() -> AuthService {
        let config = Config::from_lookup(|_| None);
        AuthService::new(
            MongoService::disconnected(&config),
            TokenService::new("secret", "HS256", 15),
            30,
        )
    }

    fn unavailable() -> ApiError {
        ApiError::ServiceUnavailable(ERR_DATABASE_UNAVAILABLE.to_string())
    }

    #[test]
    fn test_check_refresh_record() {
        let now = DateTime::now();
        assert_eq!(
            check_refresh_record(None, now).unwrap_err(),
            ApiError::Unauthorized(ERR_REFRESH_INVALID.to_string())
        );
        assert_eq!(
            check_refresh_record(Some(record(true, 60_000)), now).unwrap_err(),
            ApiError::Unauthorized(ERR_REFRESH_REVOKED.to_string())
        );
        assert_eq!(
            check_refresh_record(Some(record(false, -60_000)), now).unwrap_err(),
            ApiError::Unauthorized(ERR_REFRESH_EXPIRED.to_string())
        );
        assert!(check_refresh_record(Some(record(false, 60_000)), now).is_ok());
    }

    #[test]
    fn test_revoked_wins_over_expired() {
        assert_eq!(
            check_refresh_record(Some(record(true, -60_000)), DateTime::now()).unwrap_err(),
            ApiError::Unauthorized(ERR_REFRESH_REVOKED.to_string())
        );
    }

    #[test]
    fn test_conceal_only_hides_internal_errors() {
        let hide = conceal(ERR_LOGIN_FAILED);
        assert_eq!(
            hide(ApiError::InternalServerError("connection reset".to_string())),
            ApiError::InternalServerError(ERR_LOGIN_FAILED.to_string())
        );
        assert_eq!(hide(unavailable()), unavailable());
    }

    #[actix_web::test]
    async fn test_operations_without_database() {
        let service = disconnected_service();

        let register = service
            .register(RegisterRequest {
                email: "user@example.com".to_string(),
                password: "secret123".to_string(),
                full_name: None,
            })
            .await;
        assert_eq!(register.unwrap_err(), unavailable());

        let login = service
            .login(
                LoginRequest {
                    email: "user@example.com".to_string(),
                    password: "secret123".to_string(),
                },
                None,
            )
            .await;
        assert_eq!(login.unwrap_err(), unavailable());

        assert_eq!(
            service.refresh(Some("token"), None).await.unwrap_err(),
            RefreshError {
                error: unavailable(),
                clear_cookie: false
            }
        );

        // Logout never fails
        service.logout(Some("token")).await;
    }

    #[actix_web::test]
    async fn test_refresh_without_token() {
        let service = disconnected_service();
        for presented in [None, Some("")] {
            assert_eq!(
                service.refresh(presented, None).await.unwrap_err(),
                RefreshError {
                    error: ApiError::Unauthorized(ERR_REFRESH_MISSING.to_string()),
                    clear_cookie: false
                }
            );
        }
    }
}
