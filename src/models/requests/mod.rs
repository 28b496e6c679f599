//! Request models for API endpoints.

pub mod auth;
pub mod chat;

pub use auth::*;
pub use chat::*;
