//! Image generation through the OpenAI `images/generations` endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use synthgen_core::prompt::ImageRequest;

use crate::error::ProviderError;
use crate::http::parse_response;
use crate::traits::ImageGenerator;

const SERVICE: &str = "OpenAI";

/// Default REST base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Response of `POST /images/generations`.
#[derive(Debug, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
}

impl ImagesResponse {
    /// URL of the first returned image, if any.
    pub fn first_url(self) -> Option<String> {
        self.data.into_iter().next().and_then(|d| d.url)
    }
}

/// HTTP client for the OpenAI images API.
pub struct OpenAiImageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key,
        )
    }

    /// Create a client reusing an existing [`reqwest::Client`] and base URL.
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let parsed: ImagesResponse = parse_response(SERVICE, response).await?;
        Ok(parsed.first_url())
    }
}
