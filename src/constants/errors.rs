//! Error message constants used throughout the application.

// Authentication errors
pub const ERR_AUTH_REQUIRED: &str = "Authentication required";
pub const ERR_NOT_AUTHENTICATED: &str = "Not authenticated";
pub const ERR_INVALID_AUTH_HEADER: &str = "Invalid authorization header format";
pub const ERR_INVALID_AUTH_SCHEME: &str = "Invalid authentication scheme";
pub const ERR_INVALID_TOKEN: &str = "Invalid token or expired token";
pub const ERR_INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ERR_ACCOUNT_INACTIVE: &str = "Account is inactive";
pub const ERR_EMAIL_EXISTS: &str = "Email already registered";

// Refresh token errors
pub const ERR_REFRESH_MISSING: &str = "Refresh token missing";
pub const ERR_REFRESH_INVALID: &str = "Invalid refresh token";
pub const ERR_REFRESH_REVOKED: &str = "Token has been revoked";
pub const ERR_REFRESH_EXPIRED: &str = "Token expired";
pub const ERR_USER_NOT_FOUND: &str = "User not found";

// Unexpected failures, reported without internal detail
pub const ERR_REGISTRATION_FAILED: &str = "Registration failed";
pub const ERR_LOGIN_FAILED: &str = "Login failed";
pub const ERR_REFRESH_FAILED: &str = "Token refresh failed";

// Routing errors
pub const ERR_NOT_FOUND: &str = "The requested resource was not found";

// Service availability
pub const ERR_DATABASE_UNAVAILABLE: &str = "Database service unavailable";
pub const ERR_STORAGE_UNAVAILABLE: &str = "Storage service unavailable";
pub const ERR_GENERATOR_UNAVAILABLE: &str = "Image generation service unavailable";

// Upload errors
pub const ERR_FAILED_PROCESS_UPLOAD: &str = "Failed to process upload";
pub const ERR_FAILED_READ_FILE: &str = "Failed to read file data";
pub const ERR_FILES_REQUIRED: &str = "files field required";
pub const ERR_PDF_TOO_LARGE: &str = "File too large. Maximum size is 50MB";

// Chat errors
pub const ERR_IMAGE_REQUIRED: &str = "At least one image is required";
pub const ERR_FEEDBACK_REQUIRED: &str = "User feedback is required";
pub const ERR_IMAGE_SOURCE_REQUIRED: &str = "At least one image must have a URL or base64 data";
pub const ERR_NO_VALID_IMAGES: &str = "No valid images could be loaded";

// Validation errors
pub const ERR_VALIDATION: &str = "Validation error";
