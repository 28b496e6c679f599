//! HTTP request handlers organized by domain.

pub mod auth_handler;
pub mod chat_handler;
pub mod doc_handler;
pub mod error_handler;
pub mod health_handler;

pub use auth_handler::*;
pub use chat_handler::*;
pub use doc_handler::*;
pub use error_handler::*;
pub use health_handler::*;
