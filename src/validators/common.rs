//! Request validation helpers shared by the handlers.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use log::debug;
use validator::{Validate, ValidationErrors};

use crate::constants::ERR_VALIDATION;
use crate::errors::ApiError;

/// Convert validator errors to a 422 carrying only the first error.
///
/// Fields are visited in name order so the reported error is stable. The
/// message reads `<field> <message>` in lower case.
pub fn validation_errors_to_api_error(e: ValidationErrors) -> ApiError {
    let field_errors = e.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    let first = fields.into_iter().find_map(|field| {
        field_errors.get(field)?.first().map(|err| {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            format!("{} {}", field, message).to_lowercase()
        })
    });

    ApiError::Validation(first.unwrap_or_else(|| ERR_VALIDATION.to_string()))
}

/// Run the `validator` rules on a request body.
///
/// # Example
/// ```ignore
/// validate_body(&body)?;
/// ```
pub fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate().map_err(validation_errors_to_api_error)
}

/// Render a deserializer message the way validation errors read.
///
/// `missing field `password` at line 1 column 20` becomes
/// `password field required`; anything else is prefixed with `location`.
pub fn describe_payload_error(location: &str, message: &str) -> String {
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return format!("{} field required", field).to_lowercase();
        }
    }
    format!("{} {}", location, message).to_lowercase()
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::Deserialize(e) => describe_payload_error("body", &e.to_string()),
        other => describe_payload_error("body", &other.to_string()),
    };
    debug!("Rejected JSON body for {}: {}", req.path(), message);
    ApiError::Validation(message).into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        QueryPayloadError::Deserialize(e) => describe_payload_error("query", &e.to_string()),
        other => describe_payload_error("query", &other.to_string()),
    };
    debug!("Rejected query string for {}: {}", req.path(), message);
    ApiError::Validation(message).into()
}

/// Largest JSON body accepted (50MB); chat images may travel inline as base64.
pub const MAX_JSON_BODY_SIZE: usize = 50 * 1024 * 1024;

/// JSON extractor config answering malformed bodies with 422.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY_SIZE)
        .error_handler(json_error_handler)
}

/// Query extractor config answering malformed query strings with 422.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginRequest, RegisterRequest};

    #[test]
    fn test_first_error_wins_in_field_order() {
        let body = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            full_name: None,
        };
        assert_eq!(
            validate_body(&body),
            Err(ApiError::Validation(
                "email value is not a valid email address".to_string()
            ))
        );
    }

    #[test]
    fn test_password_length_message() {
        let body = LoginRequest {
            email: "jane@example.com".to_string(),
            password: "123".to_string(),
        };
        assert_eq!(
            validate_body(&body),
            Err(ApiError::Validation(
                "password string should have at least 6 characters".to_string()
            ))
        );
    }

    #[test]
    fn test_valid_body_passes() {
        let body = LoginRequest {
            email: "jane@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(validate_body(&body).is_ok());
    }

    #[test]
    fn test_describe_payload_error() {
        assert_eq!(
            describe_payload_error("body", "missing field `password` at line 1 column 30"),
            "password field required"
        );
        assert_eq!(
            describe_payload_error("body", "EOF while parsing an object at line 1 column 1"),
            "body eof while parsing an object at line 1 column 1"
        );
    }
}
