use synthgen_core::batch::BatchFailure;
use synthgen_core::error::CoreError;
use synthgen_providers::ProviderError;

use crate::relay::UploadFailure;

/// Errors from running a session operation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Validation, busy, or lookup failure before any outbound call.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Text generation failed: {0}")]
    TextGeneration(#[source] ProviderError),

    /// One call of an all-or-nothing batch failed; the rest were abandoned.
    #[error("Image generation call {index} failed: {source}")]
    ImageGeneration {
        index: usize,
        #[source]
        source: ProviderError,
    },

    /// Every call of a best-effort batch failed.
    #[error("All {} image generation calls failed", failures.len())]
    ImageBatchExhausted { failures: Vec<BatchFailure> },

    /// Storage refused some files of a selection; the rest were stored.
    #[error(
        "{} of {} uploads failed: {}",
        failures.len(),
        failures.len() + uploaded,
        describe_failures(failures)
    )]
    Upload {
        uploaded: usize,
        failures: Vec<UploadFailure>,
    },
}

fn describe_failures(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("'{}' ({})", f.file_name, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
