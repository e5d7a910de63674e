//! Public object storage on an S3-compatible bucket.
//!
//! Objects are written with `PutObject`; the returned URL is the configured
//! public base URL (bucket website, CDN, or virtual-hosted endpoint) joined
//! with the object key. Public read access is granted by the bucket policy,
//! not per object.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::ProviderError;
use crate::traits::{ObjectStore, StorageObject};

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a store using credentials and region from the standard AWS
    /// environment (`AWS_ACCESS_KEY_ID`, `AWS_REGION`, profiles, ...).
    pub async fn from_env(bucket: String, public_base_url: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket, public_base_url)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_public(&self, object: StorageObject) -> Result<String, ProviderError> {
        let size = object.bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .content_type(object.content_type)
            .body(ByteStream::from(object.bytes))
            .send()
            .await
            .map_err(|e| ProviderError::Storage(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = %object.key, size, "Stored object");
        Ok(self.public_url(&object.key))
    }
}
