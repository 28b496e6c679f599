//! Application constants module.
//!
//! Centralizes the strings shared between handlers, services and middleware:
//! error messages, success messages and authentication settings.

pub mod auth;
pub mod errors;
pub mod messages;

pub use auth::*;
pub use errors::*;
pub use messages::*;
