use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Deserializer};
use service_core::middleware::RequestId;

use crate::error::ChatError;
use crate::models::{ChatCompletionResponse, Transcript};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Absent or `null` is an empty conversation.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Transcript,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Transcript, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Transcript>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Relay a chat transcript to the conversation provider.
///
/// Earlier turns become history, the last turn is sent as the new message,
/// and the reply comes back in an OpenAI-style `choices` envelope.
#[tracing::instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn chat(
    State(state): State<AppState>,
    request_id: Extension<RequestId>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatCompletionResponse>, ChatError> {
    if !state.provider.is_configured() {
        tracing::error!("Chat request rejected: Gemini API key not configured");
        return Err(ChatError::MissingCredential);
    }

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Malformed chat request");
        ChatError::InvalidRequest(rejection.body_text())
    })?;

    tracing::info!(turns = request.messages.len(), "Chatbot request received");

    let adapted = request.messages.adapt();
    tracing::info!(
        history_len = adapted.prior_turns.len(),
        "Starting chat with history"
    );

    let reply = state
        .provider
        .send_message(&adapted.prior_turns, &adapted.latest_prompt)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error calling conversation provider");
            ChatError::Upstream(e)
        })?;

    tracing::info!(reply_len = reply.len(), "Chatbot response received");

    Ok(Json(ChatCompletionResponse::from_reply(reply)))
}
