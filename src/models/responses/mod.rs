//! Response models for API endpoints.

pub mod api;
pub mod auth;
pub mod chat;
pub mod doc;

pub use api::*;
pub use auth::*;
pub use chat::*;
pub use doc::*;
