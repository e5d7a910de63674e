#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use synthgen_api::config::ServerConfig;
use synthgen_api::router::build_app_router;
use synthgen_api::state::AppState;
use synthgen_core::prompt::DEFAULT_IMAGE_MODEL;
use synthgen_pipeline::{Orchestrator, SessionRegistry, UploadRelay};
use synthgen_providers::mock::{MockImageGenerator, MockObjectStore, MockTextGenerator};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        session_idle_minutes: 60,
    }
}

/// Mock providers wired into a test app; kept so tests can inspect calls.
pub struct TestProviders {
    pub text: Arc<MockTextGenerator>,
    pub images: Arc<MockImageGenerator>,
    pub store: Arc<MockObjectStore>,
}

impl TestProviders {
    pub fn new(text: MockTextGenerator, images: MockImageGenerator, store: MockObjectStore) -> Self {
        Self {
            text: Arc::new(text),
            images: Arc::new(images),
            store: Arc::new(store),
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.text.clone(), self.images.clone(), DEFAULT_IMAGE_MODEL)
    }

    pub fn relay(&self) -> UploadRelay {
        UploadRelay::new(self.store.clone())
    }
}

impl Default for TestProviders {
    fn default() -> Self {
        Self::new(
            MockTextGenerator::replying("a,b\n1,2"),
            MockImageGenerator::new(),
            MockObjectStore::new(),
        )
    }
}

/// Build the full application router over the given orchestrator and relay,
/// through the same [`build_app_router`] production uses.
pub fn build_test_app_with(orchestrator: Orchestrator, relay: UploadRelay) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionRegistry::new()),
        orchestrator: Arc::new(orchestrator),
        relay: Arc::new(relay),
    };
    build_app_router(state, &config)
}

pub fn build_test_app(providers: &TestProviders) -> Router {
    build_test_app_with(providers.orchestrator(), providers.relay())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Create a session and return its id.
pub async fn create_session(app: &Router) -> String {
    let response = send(app, Method::POST, "/api/v1/sessions", None).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

pub async fn snapshot(app: &Router, id: &str) -> Value {
    body_json(get(app, &format!("/api/v1/sessions/{id}")).await).await["data"].clone()
}

/// Build a multipart upload with one `files` part per `(name, content_type, bytes)`.
pub fn multipart_request(uri: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "synthgen-test-boundary";
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
