//! OpenAI-style reply envelope returned to chat clients.

use serde::{Deserialize, Serialize};

/// `{ "choices": [ { "message": { "content": ..., "role": "assistant" } } ] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
    pub role: String,
}

impl ChatCompletionResponse {
    /// Wrap a single assistant reply.
    pub fn from_reply(reply: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: reply.into(),
                    role: "assistant".to_string(),
                },
            }],
        }
    }
}
