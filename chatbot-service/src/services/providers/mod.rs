//! Conversational AI provider abstractions and implementations.
//!
//! The handler only depends on [`ConversationProvider`], so the Gemini
//! backend can be swapped for the mock in tests.

pub mod gemini;
pub mod mock;

use crate::models::HistoryTurn;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Response stopped early: {0}")]
    BadFinishReason(String),
}

/// A stateful-style chat backend: prior turns give context, the prompt is
/// the new message, and exactly one textual reply comes back.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    /// Whether the credential required to reach the backend is present.
    fn is_configured(&self) -> bool;

    /// Send `prompt` in the context of `history` and return the reply text.
    async fn send_message(
        &self,
        history: &[HistoryTurn],
        prompt: &str,
    ) -> Result<String, ProviderError>;
}
