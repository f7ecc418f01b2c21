//! Gemini AI provider implementation.
//!
//! Implements multi-turn chat on top of the `generateContent` REST method:
//! prior turns are sent as `contents` with `user`/`model` roles, followed by
//! the new user message, alongside a fixed system instruction.

use super::{ConversationProvider, ProviderError};
use crate::models::{HistoryTurn, Speaker};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` when the key is absent from the environment.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub system_instruction: String,
    pub timeout: Duration,
}

/// Gemini conversation provider.
pub struct GeminiConversationProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiConversationProvider {
    /// Fails only if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the API URL for the given method.
    fn api_url(&self, method: &str, api_key: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method,
            api_key
        )
    }

    fn build_request(&self, history: &[HistoryTurn], prompt: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content::text(gemini_role(turn.speaker), &turn.text))
            .collect();
        contents.push(Content::text(USER_ROLE, prompt));

        GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction {
                parts: vec![ContentPart::Text {
                    text: self.config.system_instruction.clone(),
                }],
            }),
        }
    }
}

const USER_ROLE: &str = "user";
const MODEL_ROLE: &str = "model";

fn gemini_role(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Human => USER_ROLE,
        Speaker::Agent => MODEL_ROLE,
    }
}

/// Finish reasons after which the candidate's text must not be used.
const BAD_FINISH_REASONS: [&str; 3] = ["SAFETY", "RECITATION", "LANGUAGE"];

/// Concatenate the text parts of the first candidate.
///
/// Same rules as the Gemini SDK's `response.text()`: a bad finish reason or a
/// blocked prompt is an error, anything else (even no text) is a reply.
fn extract_reply(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(feedback) = response.prompt_feedback {
            let reason = feedback.block_reason.as_deref().unwrap_or("unspecified");
            tracing::warn!(block_reason = %reason, "Gemini blocked the prompt");
            return Err(ProviderError::ContentFiltered);
        }
        return Ok(String::new());
    };

    match candidate.finish_reason.as_deref() {
        Some("SAFETY") => return Err(ProviderError::ContentFiltered),
        Some(reason) if BAD_FINISH_REASONS.contains(&reason) => {
            return Err(ProviderError::BadFinishReason(reason.to_string()));
        }
        _ => {}
    }

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text),
                    ContentPart::Other(_) => None,
                })
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl ConversationProvider for GeminiConversationProvider {
    fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    async fn send_message(
        &self,
        history: &[HistoryTurn],
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("Gemini API key not configured".to_string())
            })?;

        let request = self.build_request(history, prompt);
        let url = self.api_url("generateContent", api_key);

        tracing::debug!(
            model = %self.config.model,
            history_len = history.len(),
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError(format!("Failed to parse response: {}", e.without_url()))
        })?;

        extract_reply(api_response)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![ContentPart::Text {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(api_key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            model: "gemini-1.5-flash".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            system_instruction: "Be kind.".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_is_configured_requires_non_empty_key() {
        let missing = GeminiConversationProvider::new(config(None)).unwrap();
        let empty = GeminiConversationProvider::new(config(Some(""))).unwrap();
        let present = GeminiConversationProvider::new(config(Some("abc"))).unwrap();

        assert!(!missing.is_configured());
        assert!(!empty.is_configured());
        assert!(present.is_configured());
    }

    #[test]
    fn test_api_url() {
        let mut cfg = config(Some("abc"));
        cfg.api_base = "http://localhost:9999/v1beta/".to_string();
        let provider = GeminiConversationProvider::new(cfg).unwrap();

        assert_eq!(
            provider.api_url("generateContent", "abc"),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent?key=abc"
        );
    }

    #[test]
    fn test_request_body_maps_history_and_appends_prompt() {
        let provider = GeminiConversationProvider::new(config(Some("abc"))).unwrap();
        let history = vec![
            HistoryTurn::new(Speaker::Human, "hi"),
            HistoryTurn::new(Speaker::Agent, "hello"),
        ];

        let body = serde_json::to_value(provider.build_request(&history, "how are you")).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello" }] },
                    { "role": "user", "parts": [{ "text": "how are you" }] }
                ],
                "systemInstruction": { "parts": [{ "text": "Be kind." }] }
            })
        );
    }

    #[test]
    fn test_extract_reply_joins_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Hello, " }, { "text": "friend." }]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(extract_reply(response).unwrap(), "Hello, friend.");
    }

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_reply_reports_safety_block() {
        let stopped = response(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        assert_eq!(extract_reply(stopped), Err(ProviderError::ContentFiltered));

        let blocked = response(json!({ "promptFeedback": { "blockReason": "OTHER" } }));
        assert_eq!(extract_reply(blocked), Err(ProviderError::ContentFiltered));
    }

    #[test]
    fn test_extract_reply_rejects_recitation_and_language() {
        for reason in ["RECITATION", "LANGUAGE"] {
            let stopped = response(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "partial" }] },
                    "finishReason": reason
                }]
            }));
            assert_eq!(
                extract_reply(stopped),
                Err(ProviderError::BadFinishReason(reason.to_string()))
            );
        }
    }

    #[test]
    fn test_extract_reply_keeps_text_for_other_finish_reasons() {
        let truncated = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Drink water" }] },
                "finishReason": "MAX_TOKENS"
            }]
        }));
        assert_eq!(extract_reply(truncated).unwrap(), "Drink water");
    }

    #[test]
    fn test_extract_reply_without_candidates_or_feedback_is_empty_text() {
        assert_eq!(extract_reply(response(json!({}))).unwrap(), "");
    }

    #[test]
    fn test_extract_reply_with_feedback_but_no_block_reason_is_blocked() {
        let blocked = response(json!({ "promptFeedback": { "safetyRatings": [] } }));
        assert_eq!(extract_reply(blocked), Err(ProviderError::ContentFiltered));
    }

    #[test]
    fn test_extract_reply_without_text_parts_is_empty_text() {
        let bare = response(json!({ "candidates": [{ "finishReason": "STOP" }] }));
        assert_eq!(extract_reply(bare).unwrap(), "");

        let non_text = response(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": {} }] } }]
        }));
        assert_eq!(extract_reply(non_text).unwrap(), "");
    }

    #[test]
    fn test_client_build_error_is_not_a_provider_error() {
        let built: Result<GeminiConversationProvider, reqwest::Error> =
            GeminiConversationProvider::new(config(Some("abc")));
        assert!(built.is_ok());
    }

    #[tokio::test]
    async fn test_send_message_without_key_fails_before_network() {
        let provider = GeminiConversationProvider::new(config(None)).unwrap();
        let result = provider.send_message(&[], "hi").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
