//! Mock provider implementation for testing.

use super::{ConversationProvider, ProviderError};
use crate::models::HistoryTurn;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
enum Script {
    Echo,
    Reply(String),
    Fail(ProviderError),
}

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub history: Vec<HistoryTurn>,
    pub prompt: String,
}

/// Mock conversation provider for testing.
///
/// By default it echoes the prompt back as `Mock response for: <prompt>`.
pub struct MockConversationProvider {
    configured: bool,
    script: Script,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
}

impl MockConversationProvider {
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            script: Script::Echo,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    /// Answer every message with `reply`.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.script = Script::Reply(reply.into());
        self
    }

    /// Fail every message with `error`.
    pub fn with_failure(mut self, error: ProviderError) -> Self {
        self.script = Script::Fail(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConversationProvider for MockConversationProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send_message(
        &self,
        history: &[HistoryTurn],
        prompt: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(RecordedCall {
            history: history.to_vec(),
            prompt: prompt.to_string(),
        });

        if !self.configured {
            return Err(ProviderError::NotConfigured(
                "Mock conversation provider not enabled".to_string(),
            ));
        }

        match &self.script {
            Script::Echo => Ok(format!("Mock response for: {}", prompt)),
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}
