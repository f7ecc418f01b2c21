//! Domain models for the chatbot service.

pub mod completion;
pub mod transcript;

pub use completion::{ChatCompletionResponse, Choice, ChoiceMessage};
pub use transcript::{AdaptedRequest, ChatRole, ChatTurn, HistoryTurn, Speaker, Transcript};
