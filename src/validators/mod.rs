//! Request validators.

pub mod chat;
pub mod common;
pub mod upload;

pub use chat::validate_chat_request;
pub use common::{json_config, query_config, validate_body};
pub use upload::{validate_pdf_filename, validate_pdf_size};
