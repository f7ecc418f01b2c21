//! Errors returned by the chat endpoint.
//!
//! Bodies are always `{"error": "<message>"}`. Upstream failures collapse into
//! one generic message; the cause is only logged.

use crate::services::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::ErrorResponse;
use thiserror::Error;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "Gemini API key not configured";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to communicate with chatbot service";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,

    #[error("{}", UPSTREAM_FAILURE_MESSAGE)]
    Upstream(#[source] ProviderError),

    #[error("{0}")]
    InvalidRequest(String),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MissingCredential | ChatError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
