//! Outbound generation calls.
//!
//! The orchestrator owns the injected provider clients and the batch
//! settings. It knows nothing about sessions: callers hand it a request and
//! get back an explicit outcome or a [`PipelineError`].

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use synthgen_core::batch::{validate_concurrency, BatchFailure, BatchPolicy};
use synthgen_core::error::CoreError;
use synthgen_core::prompt::{ImageBatch, TabularRequest};
use synthgen_providers::{ImageGenerator, ProviderError, TextGenerator};

use crate::error::PipelineError;

/// Result of one image batch that was accepted under the active policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageBatchOutcome {
    /// URLs in request order.
    pub urls: Vec<String>,
    /// Calls that failed (best-effort only).
    pub failures: Vec<BatchFailure>,
    /// Calls that succeeded without returning a URL.
    pub missing: Vec<usize>,
}

pub struct Orchestrator {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    image_model: String,
    concurrency: usize,
    policy: BatchPolicy,
}

impl Orchestrator {
    /// Build an orchestrator that runs image batches sequentially under the
    /// default policy.
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            text,
            images,
            image_model: image_model.into(),
            concurrency: synthgen_core::batch::DEFAULT_IMAGE_CONCURRENCY,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, CoreError> {
        validate_concurrency(concurrency)?;
        self.concurrency = concurrency;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    /// Issue exactly one text-generation call and return its raw text.
    ///
    /// Neither field is checked for emptiness.
    pub async fn generate_tabular(&self, request: &TabularRequest) -> Result<String, PipelineError> {
        let prompt = request.to_prompt();
        tracing::debug!(
            model = %self.text.model_id(),
            prompt_len = prompt.len(),
            "Requesting tabular data"
        );
        self.text
            .generate_text(&prompt)
            .await
            .map_err(PipelineError::TextGeneration)
    }

    /// Run the fixed-size image batch for `description`.
    ///
    /// At most `concurrency` calls are in flight. Results are assembled in
    /// request order regardless of completion order.
    pub async fn generate_images(&self, description: &str) -> Result<ImageBatchOutcome, PipelineError> {
        let batch = ImageBatch::new(self.image_model.as_str(), description);
        let request = &batch.request;
        let images = self.images.as_ref();

        let mut calls = std::pin::pin!(stream::iter(0..batch.batch_size)
            .map(|index| async move { (index, images.generate_image(request).await) })
            .buffered(self.concurrency));

        let mut outcome = ImageBatchOutcome::default();
        while let Some((index, result)) = calls.next().await {
            match result {
                Ok(Some(url)) => outcome.urls.push(url),
                Ok(None) => {
                    tracing::warn!(index, "Image generation returned no URL, skipping");
                    outcome.missing.push(index);
                }
                Err(source) => match self.policy {
                    // Dropping the stream abandons any call not yet started.
                    BatchPolicy::AllOrNothing => {
                        return Err(PipelineError::ImageGeneration { index, source });
                    }
                    BatchPolicy::BestEffort => {
                        tracing::warn!(index, error = %source, "Image generation call failed");
                        outcome.failures.push(failure(index, &source));
                    }
                },
            }
        }

        if outcome.urls.is_empty() && outcome.failures.len() == batch.batch_size {
            return Err(PipelineError::ImageBatchExhausted {
                failures: outcome.failures,
            });
        }
        Ok(outcome)
    }
}

fn failure(index: usize, error: &ProviderError) -> BatchFailure {
    BatchFailure {
        index,
        error: error.to_string(),
    }
}
