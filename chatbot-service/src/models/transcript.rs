//! Chat transcript model and its adaptation into a (history, prompt) pair.
//!
//! Callers send the whole conversation on every request. A turn-based
//! conversational backend instead wants the earlier turns as context and the
//! newest turn as the message to answer; [`Transcript::adapt`] performs that
//! split.

use serde::{de, Deserialize, Deserializer};

/// Author of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Any other non-empty role, e.g. `"system"`. Kept so the final turn can
    /// still be forwarded; dropped from history.
    Other(String),
}

impl<'de> Deserialize<'de> for ChatRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let role = String::deserialize(deserializer)?;
        match role.as_str() {
            "" => Err(de::Error::custom("role must not be empty")),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Ok(ChatRole::Other(role)),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Ordered conversation as supplied by the caller, oldest turn first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Split the transcript into prior history and the latest prompt.
    ///
    /// The last turn becomes the prompt verbatim, whatever its role. Earlier
    /// turns keep their order; only user and assistant turns survive.
    /// An empty transcript yields an empty prompt and no history.
    pub fn adapt(&self) -> AdaptedRequest {
        let Some((last, earlier)) = self.turns.split_last() else {
            return AdaptedRequest::default();
        };

        let prior_turns = earlier
            .iter()
            .filter_map(|turn| {
                Speaker::from_role(&turn.role).map(|speaker| HistoryTurn {
                    speaker,
                    text: turn.content.clone(),
                })
            })
            .collect();

        AdaptedRequest {
            prior_turns,
            latest_prompt: last.content.clone(),
        }
    }
}

impl From<Vec<ChatTurn>> for Transcript {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self::new(turns)
    }
}

/// Speaker tag used in conversational history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Human,
    Agent,
}

impl Speaker {
    /// `None` for roles that have no place in history.
    pub fn from_role(role: &ChatRole) -> Option<Self> {
        match role {
            ChatRole::User => Some(Speaker::Human),
            ChatRole::Assistant => Some(Speaker::Agent),
            ChatRole::Other(_) => None,
        }
    }
}

/// A prior turn, as context for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Result of adapting a transcript for a turn-based conversation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptedRequest {
    pub prior_turns: Vec<HistoryTurn>,
    pub latest_prompt: String,
}
