use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness check. Does not contact Gemini.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "chatbot-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
