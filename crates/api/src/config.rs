use synthgen_core::batch::{BatchPolicy, DEFAULT_IMAGE_CONCURRENCY};
use synthgen_core::prompt::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use synthgen_core::upload::{
    DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_CATEGORY,
};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Covers a whole
    /// image batch, so it is far longer than a typical API timeout.
    pub request_timeout_secs: u64,
    /// Sessions idle for longer than this are dropped (default: `60`).
    pub session_idle_minutes: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                   |
    /// | `SESSION_IDLE_MINUTES` | `60`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let session_idle_minutes: i64 = std::env::var("SESSION_IDLE_MINUTES")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SESSION_IDLE_MINUTES must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session_idle_minutes,
        }
    }
}

/// External service configuration.
///
/// API keys are required; everything else has a default.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Override for the Gemini REST endpoint (proxies, test servers).
    pub gemini_base_url: Option<String>,
    pub openai_api_key: String,
    pub openai_image_model: String,
    pub openai_base_url: Option<String>,
    /// Image calls in flight per batch (1 = sequential).
    pub image_concurrency: usize,
    pub batch_policy: BatchPolicy,
    pub storage_bucket: String,
    /// Public base URL objects are served from.
    pub storage_public_url: String,
    /// Key prefix ("upload category") for relayed files.
    pub storage_prefix: String,
    pub max_concurrent_uploads: usize,
    pub max_upload_bytes: usize,
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `GEMINI_API_KEY`         | required                |
    /// | `GEMINI_MODEL`           | `gemini-1.5-pro-latest` |
    /// | `GEMINI_BASE_URL`        | Google endpoint         |
    /// | `OPENAI_API_KEY`         | required                |
    /// | `OPENAI_IMAGE_MODEL`     | `dall-e-3`              |
    /// | `OPENAI_BASE_URL`        | OpenAI endpoint         |
    /// | `IMAGE_CONCURRENCY`      | `1`                     |
    /// | `IMAGE_BATCH_POLICY`     | `all_or_nothing`        |
    /// | `STORAGE_BUCKET`         | required                |
    /// | `STORAGE_PUBLIC_URL`     | required                |
    /// | `STORAGE_PREFIX`         | `myPublicImages`        |
    /// | `MAX_CONCURRENT_UPLOADS` | `2`                     |
    /// | `MAX_UPLOAD_BYTES`       | `10485760`              |
    ///
    /// Panics on a missing key or malformed value; misconfiguration should
    /// fail at startup.
    pub fn from_env() -> Self {
        let gemini_api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_TEXT_MODEL.into());
        let gemini_base_url = std::env::var("GEMINI_BASE_URL").ok();

        let openai_api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
        let openai_image_model =
            std::env::var("OPENAI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.into());
        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok();

        let image_concurrency: usize = std::env::var("IMAGE_CONCURRENCY")
            .map(|v| v.parse().expect("IMAGE_CONCURRENCY must be a valid usize"))
            .unwrap_or(DEFAULT_IMAGE_CONCURRENCY);

        let batch_policy = std::env::var("IMAGE_BATCH_POLICY")
            .map(|v| BatchPolicy::from_name(&v).unwrap_or_else(|e| panic!("{e}")))
            .unwrap_or_default();

        let storage_bucket = std::env::var("STORAGE_BUCKET").expect("STORAGE_BUCKET must be set");
        let storage_public_url =
            std::env::var("STORAGE_PUBLIC_URL").expect("STORAGE_PUBLIC_URL must be set");
        let storage_prefix =
            std::env::var("STORAGE_PREFIX").unwrap_or_else(|_| DEFAULT_UPLOAD_CATEGORY.into());

        let max_concurrent_uploads: usize = std::env::var("MAX_CONCURRENT_UPLOADS")
            .map(|v| v.parse().expect("MAX_CONCURRENT_UPLOADS must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS);

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            openai_api_key,
            openai_image_model,
            openai_base_url,
            image_concurrency,
            batch_policy,
            storage_bucket,
            storage_public_url,
            storage_prefix,
            max_concurrent_uploads,
            max_upload_bytes,
        }
    }
}
