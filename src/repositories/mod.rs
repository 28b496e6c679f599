//! Repository layer for database operations.
//!
//! Services hold business rules; repositories only translate them into
//! MongoDB queries on typed collections.

pub mod chat_history_repository;
pub mod refresh_token_repository;
pub mod user_repository;

pub use chat_history_repository::ChatHistoryRepository;
pub use refresh_token_repository::RefreshTokenRepository;
pub use user_repository::UserRepository;
