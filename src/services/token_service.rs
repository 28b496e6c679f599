//! Access token issuing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, warn};
use std::str::FromStr;

use crate::constants::{
    ERR_INVALID_AUTH_HEADER, ERR_INVALID_AUTH_SCHEME, ERR_INVALID_TOKEN, ERR_NOT_AUTHENTICATED,
};
use crate::errors::ApiError;
use crate::models::Claims;

/// Signs and verifies HMAC access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// Only the HMAC family can be used with a shared secret; any other
    /// algorithm name falls back to HS256.
    pub fn new(secret: &str, algorithm: &str, access_token_minutes: i64) -> Self {
        let algorithm = match Algorithm::from_str(algorithm.trim()) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => {
                warn!(
                    "Unsupported JWT algorithm '{}', falling back to HS256",
                    algorithm
                );
                Algorithm::HS256
            }
        };

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_token_ttl: Duration::minutes(access_token_minutes),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn expires_in_seconds(&self) -> i64 {
        self.access_token_ttl.num_seconds()
    }

    /// Create an access token with the configured lifetime.
    pub fn create_token(&self, user_id: &str, email: &str) -> Result<String, ApiError> {
        self.create_token_with_ttl(user_id, email, self.access_token_ttl)
    }

    pub fn create_token_with_ttl(
        &self,
        user_id: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))
    }

    /// Decode and validate a raw token.
    pub fn decode_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(self.algorithm))
            .map(|data| data.claims)
            .map_err(|e| {
                error!("JWT validation error: {}", e);
                ApiError::Forbidden(ERR_INVALID_TOKEN.to_string())
            })
    }

    /// Verify an `Authorization` header value and return its claims.
    pub fn verify_header(&self, auth_header: Option<&str>) -> Result<Claims, ApiError> {
        let header = match auth_header {
            Some(header) if !header.is_empty() => header,
            _ => {
                error!("No authorization header found");
                return Err(ApiError::Unauthorized(ERR_NOT_AUTHENTICATED.to_string()));
            }
        };

        let mut parts = header.split_whitespace();
        let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) => (scheme, token),
            _ => {
                error!("Invalid authorization header format");
                return Err(ApiError::Unauthorized(ERR_INVALID_AUTH_HEADER.to_string()));
            }
        };

        if !scheme.eq_ignore_ascii_case("bearer") {
            error!("Invalid authentication scheme: {}", scheme);
            return Err(ApiError::Unauthorized(ERR_INVALID_AUTH_SCHEME.to_string()));
        }

        let claims = self.decode_token(token)?;
        debug!("Token verified for user: {}", claims.user_id);
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", "HS256", 60)
    }

    #[test]
    fn test_create_and_decode_token() {
        let tokens = service();
        let token = tokens.create_token("64b7f0c2a1", "user@example.com").unwrap();
        let claims = tokens.decode_token(&token).unwrap();

        assert_eq!(claims.user_id, "64b7f0c2a1");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(tokens.expires_in_seconds(), 3600);
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let tokens = service();
        let token = tokens
            .create_token_with_ttl("id", "user@example.com", Duration::hours(-2))
            .unwrap();
        assert_eq!(
            tokens.decode_token(&token),
            Err(ApiError::Forbidden(ERR_INVALID_TOKEN.to_string()))
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_is_forbidden() {
        let other = TokenService::new("other-secret", "HS256", 60);
        let token = other.create_token("id", "user@example.com").unwrap();
        assert!(matches!(
            service().decode_token(&token),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_verify_header_failures() {
        let tokens = service();
        assert_eq!(
            tokens.verify_header(None),
            Err(ApiError::Unauthorized(ERR_NOT_AUTHENTICATED.to_string()))
        );
        assert_eq!(
            tokens.verify_header(Some("Bearer")),
            Err(ApiError::Unauthorized(ERR_INVALID_AUTH_HEADER.to_string()))
        );
        assert_eq!(
            tokens.verify_header(Some("Bearer a b")),
            Err(ApiError::Unauthorized(ERR_INVALID_AUTH_HEADER.to_string()))
        );
        assert_eq!(
            tokens.verify_header(Some("Basic dXNlcjpwYXNz")),
            Err(ApiError::Unauthorized(ERR_INVALID_AUTH_SCHEME.to_string()))
        );
        assert_eq!(
            tokens.verify_header(Some("Bearer not-a-jwt")),
            Err(ApiError::Forbidden(ERR_INVALID_TOKEN.to_string()))
        );
    }

    #[test]
    fn test_verify_header_accepts_any_scheme_case() {
        let tokens = service();
        let token = tokens.create_token("id", "user@example.com").unwrap();
        let claims = tokens
            .verify_header(Some(&format!("bEaReR {}", token)))
            .unwrap();
        assert_eq!(claims.user_id, "id");
    }

    #[test]
    fn test_unsupported_algorithm_falls_back_to_hs256() {
        assert_eq!(
            TokenService::new("s", "RS256", 1).algorithm(),
            Algorithm::HS256
        );
        assert_eq!(
            TokenService::new("s", "HS512", 1).algorithm(),
            Algorithm::HS512
        );
        assert_eq!(
            TokenService::new("s", "nonsense", 1).algorithm(),
            Algorithm::HS256
        );
    }
}
