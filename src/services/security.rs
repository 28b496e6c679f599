//! Password hashing and refresh token primitives.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bcrypt::{hash, verify, DEFAULT_COST};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::constants::OPAQUE_TOKEN_BYTES;
use crate::errors::ApiError;

/// Hash a password using bcrypt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    Ok(verify(password, hashed)?)
}

/// Random URL-safe string used as a refresh token.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a refresh token, as stored in the database.
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
