//! HTTP handlers for the chatbot service.

pub mod chat;
pub mod health;

pub use chat::{chat, ChatRequest};
pub use health::health_check;
