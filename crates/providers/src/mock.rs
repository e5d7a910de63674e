//! In-memory test doubles for every provider trait.
//!
//! Each double records what it was asked and can be scripted to fail. A
//! [`Gate`] can hold calls open until the test releases them, which makes
//! the busy interval observable.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use synthgen_core::prompt::ImageRequest;
use tokio::sync::Semaphore;

use crate::error::ProviderError;
use crate::traits::{ImageGenerator, ObjectStore, StorageObject, TextGenerator};

/// Base URL of images produced by [`MockImageGenerator`].
pub const MOCK_IMAGE_BASE_URL: &str = "https://images.mock.test";

/// Base URL of objects stored by [`MockObjectStore`].
pub const MOCK_STORAGE_BASE_URL: &str = "https://files.mock.test";

fn mock_failure(service: &'static str, body: &str) -> ProviderError {
    ProviderError::Api {
        service,
        status: 500,
        body: body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Holds provider calls until [`Gate::open`] is called.
#[derive(Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
    opened: Arc<AtomicBool>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
            opened: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Release every current and future waiter. Opening twice is a no-op.
    pub fn open(&self) {
        if !self.opened.swap(true, Ordering::SeqCst) {
            self.permits.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    async fn pass(&self) {
        // The semaphore is never closed, so acquire cannot fail.
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

pub struct MockTextGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Gate>,
}

impl MockTextGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    fn model_id(&self) -> &str {
        "mock-text"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.reply
            .clone()
            .map_err(|body| mock_failure("MockText", &body))
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// Returns `{MOCK_IMAGE_BASE_URL}/{call}.png` for each call, numbering calls
/// from 0 in the order they arrive.
#[derive(Default)]
pub struct MockImageGenerator {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    missing_url_on: Vec<usize>,
    requests: Mutex<Vec<ImageRequest>>,
    gate: Option<Gate>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the calls with these zero-based numbers.
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on = calls.into_iter().collect();
        self
    }

    /// Answer these calls without a URL.
    pub fn missing_url_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.missing_url_on = calls.into_iter().collect();
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn url_for(call: usize) -> String {
        format!("{MOCK_IMAGE_BASE_URL}/{call}.png")
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        if self.fail_on.contains(&call) {
            return Err(mock_failure("MockImage", &format!("call {call} failed")));
        }
        if self.missing_url_on.contains(&call) {
            return Ok(None);
        }
        Ok(Some(Self::url_for(call)))
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockObjectStore {
    fail: bool,
    fail_for: Vec<String>,
    stored: Mutex<Vec<StorageObject>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Gate>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Refuse objects whose key ends with one of these file names.
    pub fn failing_for<S: Into<String>>(mut self, file_names: impl IntoIterator<Item = S>) -> Self {
        self.fail_for = file_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.stored
            .lock()
            .map(|s| s.iter().map(|o| o.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Highest number of `put_public` calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_public(&self, object: StorageObject) -> Result<String, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.pass().await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(ProviderError::Storage("mock storage unavailable".into()));
        }
        if self.fail_for.iter().any(|name| object.key.ends_with(name.as_str())) {
            return Err(ProviderError::Storage(format!("mock storage refused {}", object.key)));
        }
        let url = format!("{MOCK_STORAGE_BASE_URL}/{}", object.key);
        if let Ok(mut stored) = self.stored.lock() {
            stored.push(object);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthgen_core::prompt::DEFAULT_IMAGE_MODEL;

    #[tokio::test]
    async fn image_mock_numbers_calls_and_fails_on_request() {
        let gen = MockImageGenerator::new().failing_on([1]).missing_url_on([2]);
        let req = ImageRequest::new(DEFAULT_IMAGE_MODEL, "cat");

        assert_eq!(
            gen.generate_image(&req).await.unwrap(),
            Some(MockImageGenerator::url_for(0))
        );
        assert!(gen.generate_image(&req).await.is_err());
        assert_eq!(gen.generate_image(&req).await.unwrap(), None);
        assert_eq!(gen.calls(), 3);
    }

    #[tokio::test]
    async fn gate_holds_until_opened() {
        let gate = Gate::new();
        let gen = Arc::new(MockTextGenerator::replying("ok").gated(gate.clone()));

        let task = {
            let gen = Arc::clone(&gen);
            tokio::spawn(async move { gen.generate_text("p").await })
        };
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.open();
        assert_eq!(task.await.unwrap().unwrap(), "ok");
        assert_eq!(gen.prompts(), vec!["p".to_string()]);
    }

    #[tokio::test]
    async fn gate_can_be_opened_twice() {
        let gate = Gate::new();
        let gen = MockTextGenerator::replying("ok").gated(gate.clone());

        gate.open();
        gate.open();
        assert_eq!(gen.generate_text("p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn storage_mock_refuses_named_files() {
        let store = MockObjectStore::new().failing_for(["b.png"]);
        let object = |key: &str| StorageObject {
            key: key.into(),
            content_type: "image/png",
            bytes: vec![1],
        };

        assert!(store.put_public(object("myPublicImages/x-a.png")).await.is_ok());
        assert!(store.put_public(object("myPublicImages/x-b.png")).await.is_err());
        assert_eq!(store.stored_keys(), vec!["myPublicImages/x-a.png".to_string()]);
    }

    #[tokio::test]
    async fn storage_mock_returns_prefixed_url() {
        let store = MockObjectStore::new();
        let url = store
            .put_public(StorageObject {
                key: "myPublicImages/a.png".into(),
                content_type: "image/png",
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();
        assert_eq!(url, "https://files.mock.test/myPublicImages/a.png");
        assert_eq!(store.stored_keys(), vec!["myPublicImages/a.png".to_string()]);
    }
}
