//! Seams between the orchestrator and the external services.
//!
//! Clients are constructed explicitly and injected as `Arc<dyn Trait>`, so
//! tests substitute the doubles from [`crate::mock`].

use async_trait::async_trait;
use synthgen_core::prompt::ImageRequest;

use crate::error::ProviderError;

/// Text completion from a single prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model_id(&self) -> &str;

    /// Return the full response text, verbatim.
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// One image-generation call.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Return the URL of the first generated image, or `None` when the
    /// service answered without one.
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, ProviderError>;
}

/// An object to write to public storage.
#[derive(Debug, Clone)]
pub struct StorageObject {
    pub key: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Public object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the object and return its publicly reachable URL.
    async fn put_public(&self, object: StorageObject) -> Result<String, ProviderError>;
}
