//! Clients for the external generation and storage services.
//!
//! Provides the provider traits consumed by the orchestrator, REST clients
//! for Gemini (text) and OpenAI (images), an S3-backed object store, and
//! in-memory doubles for tests.

pub mod error;
pub mod gemini;
mod http;
pub mod mock;
pub mod openai;
pub mod s3;
pub mod traits;

pub use error::ProviderError;
pub use gemini::GeminiTextClient;
pub use openai::OpenAiImageClient;
pub use s3::S3ObjectStore;
pub use traits::{ImageGenerator, ObjectStore, StorageObject, TextGenerator};
