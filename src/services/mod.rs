//! Services organized by domain concern.

pub mod auth_service;
pub mod chat_service;
pub mod doc_service;
pub mod file_service;
pub mod gemini_client;
pub mod generator;
pub mod mongo_service;
pub mod openai_client;
pub mod pdf_extractor;
pub mod prompts;
pub mod security;
pub mod storage;
pub mod token_service;

pub use auth_service::AuthService;
pub use chat_service::ChatService;
pub use doc_service::DocService;
pub use mongo_service::MongoService;
pub use token_service::TokenService;
