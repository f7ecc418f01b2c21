#![allow(dead_code)]

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json, Router,
};
use chatbot_service::config::ChatbotConfig;
use chatbot_service::services::ConversationProvider;
use chatbot_service::startup::{build_router, AppState, Application};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Service configuration for tests, bound to a random port.
pub fn test_config(vars: &[(&str, &str)]) -> ChatbotConfig {
    let common = CoreConfig {
        port: 0,
        log_level: "error".to_string(),
        otlp_endpoint: None,
    };
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    ChatbotConfig::from_lookup(common, |key| vars.get(key).cloned())
        .expect("Failed to build test configuration")
}

/// Router wired to the given provider, for `oneshot` tests.
pub fn test_router(provider: Arc<dyn ConversationProvider>) -> Router {
    build_router(AppState {
        config: test_config(&[]),
        provider,
    })
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the real Gemini-backed application.
    pub async fn spawn(config: ChatbotConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    pub async fn spawn_with_provider(provider: Arc<dyn ConversationProvider>) -> Self {
        let app = Application::build_with_provider(test_config(&[]), provider)
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    async fn run(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}

/// A request received by the Gemini stub.
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub path_and_query: String,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    response: Value,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

/// Local stand-in for the Gemini REST API answering every POST with a fixed
/// status and body.
pub struct GeminiStub {
    pub api_base: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl GeminiStub {
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            response,
            requests: requests.clone(),
        };

        let router = Router::new().fallback(stub_handler).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            api_base: format!("http://127.0.0.1:{}/v1beta", port),
            requests,
        }
    }

    /// Stub answering with a single text candidate.
    pub async fn replying(text: &str) -> Self {
        Self::start(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4 }
            }),
        )
        .await
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_handler(
    State(state): State<StubState>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(StubRequest {
        path_and_query: uri
            .path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        body,
    });
    (state.status, Json(state.response.clone()))
}
