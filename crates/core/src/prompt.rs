//! Request payloads handed to the generation providers.
//!
//! Both request types are built fresh for every submit and dropped once the
//! response has been stored.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of image requests issued per image-mode submit.
pub const IMAGE_BATCH_SIZE: usize = 10;

/// Images requested per individual generation call.
pub const IMAGES_PER_CALL: u32 = 1;

/// Square output resolution requested from the image service.
pub const IMAGE_SIZE: &str = "1024x1024";

/// Default text-generation model.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-pro-latest";

/// Default image-generation model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Delimiter wrapped around the pasted sample inside the prompt.
const SAMPLE_DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Tabular
// ---------------------------------------------------------------------------

/// One tabular synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRequest {
    pub description: String,
    pub sample_data: String,
}

impl TabularRequest {
    pub fn new(description: impl Into<String>, sample_data: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sample_data: sample_data.into(),
        }
    }

    /// Render the natural-language instruction sent to the text model.
    ///
    /// The instruction embeds both strings verbatim, asks for output at least
    /// double the size of the sample, similar to but not copied from it, and
    /// constrains the answer to the synthetic data alone.
    pub fn to_prompt(&self) -> String {
        format!(
            "I would like you to create more synthetic data for the following dataset, \
             which is delimited by three dashes (-). The primary purpose of synthetic data \
             is to provide a substitute for real data through prediction. This synthetic \
             data should mimic the characteristics of the real data, but should not contain \
             information from the actual data. Produce a deep dataset of synthetic data that \
             is at least double the size of the input data. The synthetic data should be \
             about: {description}. Regardless of if it's possible to create \"accurate\" \
             synthetic data, make sure your response is solely synthetic data and no other \
             text.\n{SAMPLE_DELIMITER}Data: {sample}\n{SAMPLE_DELIMITER}",
            description = self.description,
            sample = self.sample_data,
        )
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A single image-generation call, serialized as the provider's JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

impl ImageRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            n: IMAGES_PER_CALL,
            size: IMAGE_SIZE.to_string(),
        }
    }
}

/// One image-mode submit: the same [`ImageRequest`] repeated `batch_size` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch {
    pub request: ImageRequest,
    pub batch_size: usize,
}

impl ImageBatch {
    pub fn new(model: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            request: ImageRequest::new(model, description),
            batch_size: IMAGE_BATCH_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
