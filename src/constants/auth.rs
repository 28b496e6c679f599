//! Authentication constants.

/// Name of the HttpOnly cookie carrying the opaque refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// The refresh cookie is only sent to the refresh endpoint.
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Path prefixes reachable without an access token.
pub const PUBLIC_PATHS: [&str; 8] = [
    "/docs",
    "/redoc",
    "/openapi.json",
    "/auth/login",
    "/auth/register",
    "/auth/refresh",
    "/auth/logout",
    "/health",
];

/// Random bytes in an opaque refresh token before encoding.
pub const OPAQUE_TOKEN_BYTES: usize = 64;
