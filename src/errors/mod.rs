use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use mongodb::error::{ErrorKind, WriteFailure};
use std::fmt;

use crate::constants::{ERR_INVALID_TOKEN, ERR_STORAGE_UNAVAILABLE};
use crate::models::ErrorResponse;
use crate::services::generator::GenerationError;
use crate::services::storage::StorageError;

/// Duplicate key violation reported by MongoDB unique indexes.
const MONGO_DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    MethodNotAllowed(String),
    Validation(String),
    InternalServerError(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::MethodNotAllowed(message)
            | ApiError::Validation(message)
            | ApiError::InternalServerError(message)
            | ApiError::ServiceUnavailable(message) => message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(message) => write!(f, "Bad Request: {}", message),
            ApiError::Unauthorized(message) => write!(f, "Unauthorized: {}", message),
            ApiError::Forbidden(message) => write!(f, "Forbidden: {}", message),
            ApiError::NotFound(message) => write!(f, "Not Found: {}", message),
            ApiError::MethodNotAllowed(message) => write!(f, "Method Not Allowed: {}", message),
            ApiError::Validation(message) => write!(f, "Validation Error: {}", message),
            ApiError::InternalServerError(message) => {
                write!(f, "Internal Server Error: {}", message)
            }
            ApiError::ServiceUnavailable(message) => {
                write!(f, "Service Unavailable: {}", message)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.message()))
    }
}

/// True when a MongoDB write failed on a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error))
            if write_error.code == MONGO_DUPLICATE_KEY
    )
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ApiError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        ApiError::Forbidden(ERR_INVALID_TOKEN.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable => {
                ApiError::ServiceUnavailable(ERR_STORAGE_UNAVAILABLE.to_string())
            }
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}
