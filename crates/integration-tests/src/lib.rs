//! Integration tests for Kalakar Studio.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kalakar-integration-tests
//! ```
//!
//! No network access or API key is needed. Flows run against
//! [`ScriptedModel`], the Gemini client against a `wiremock` server, and the
//! HTTP surface against a server bound to an ephemeral local port.
//!
//! # Test Categories
//!
//! - `flows` - every flow end to end through the generator
//! - `gemini_client` - wire format and status mapping of the HTTP client
//! - `http` - axum routes and error responses
//! - `properties` - proptest invariants for templates and validation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use kalakar_studio::config::{DEFAULT_GEMINI_MODEL, GeminiConfig, StudioConfig};
use kalakar_studio::flows::Flows;
use kalakar_studio::genai::{
    GenerateContentRequest, GenerateContentResponse, GenerationError, ModelClient, Part,
};
use kalakar_studio::services::InMemoryOrderStore;
use kalakar_studio::state::AppState;
use secrecy::SecretString;
use serde_json::Value;

type Responder =
    dyn Fn(&GenerateContentRequest, usize) -> Result<GenerateContentResponse, GenerationError>
        + Send
        + Sync;

/// A model whose answers are computed by a closure.
///
/// The closure receives each request and its zero-based call index. Every
/// request is recorded for later inspection.
pub struct ScriptedModel {
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&GenerateContentRequest, usize) -> Result<GenerateContentResponse, GenerationError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same JSON document.
    #[must_use]
    pub fn answering(json: &Value) -> Arc<Self> {
        let text = json.to_string();
        Self::new(move |_, _| Ok(GenerateContentResponse::from_text(text.clone())))
    }

    /// Answer from `responses` in order; fail with `EmptyResponse` once exhausted.
    #[must_use]
    pub fn replaying(responses: Vec<GenerateContentResponse>) -> Arc<Self> {
        Self::new(move |_, call| {
            responses
                .get(call)
                .cloned()
                .ok_or(GenerationError::EmptyResponse)
        })
    }

    /// Number of `generate_content` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of every request received, in call order.
    pub fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The rendered user prompt of every request, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().iter().map(prompt_of).collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn model(&self) -> &'static str {
        "scripted"
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        (self.responder)(request, call)
    }
}

/// Text of the first user turn of a request.
#[must_use]
pub fn prompt_of(request: &GenerateContentRequest) -> String {
    request
        .contents
        .first()
        .map(kalakar_studio::genai::Content::text)
        .unwrap_or_default()
}

/// A model turn that calls one tool.
#[must_use]
pub fn tool_call(name: &str, args: Value) -> GenerateContentResponse {
    GenerateContentResponse::from_parts(vec![Part::function_call(name, args)])
}

/// Flows over `model` and the sample order book.
///
/// # Panics
///
/// Panics if flow registration fails.
#[must_use]
pub fn flows_with(model: Arc<ScriptedModel>) -> Flows {
    Flows::new(model, Arc::new(InMemoryOrderStore::with_sample_orders()))
        .expect("flows register")
}

/// Gemini settings pointing at `base_url` with a test key.
///
/// # Panics
///
/// Panics if `base_url` is not a valid URL.
#[must_use]
pub fn gemini_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: SecretString::from("AIzaSyD-integration-test-key-9f3k"),
        model: DEFAULT_GEMINI_MODEL.to_string(),
        base_url: url::Url::parse(base_url).expect("valid base URL"),
    }
}

/// Serve the full application on an ephemeral local port.
///
/// Returns the bound address; the server runs until the test runtime stops.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_app(model: Arc<ScriptedModel>) -> SocketAddr {
    let orders = Arc::new(InMemoryOrderStore::with_sample_orders());
    let flows = flows_with(model);
    let config = StudioConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        gemini: gemini_config("http://127.0.0.1:9"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let app = kalakar_studio::routes::app(AppState::new(config, flows, orders));

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
