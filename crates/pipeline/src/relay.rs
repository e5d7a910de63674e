//! Upload relay: validated user files to public object storage.

use std::sync::Arc;

use serde::Serialize;
use synthgen_core::error::CoreError;
use synthgen_core::upload::{
    object_key, validate_file_count, validate_image_upload, ImageMime, UploadedFile,
    DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_CATEGORY,
};
use synthgen_providers::{ObjectStore, StorageObject};
use tokio::sync::Semaphore;

use crate::error::PipelineError;

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct UploadRelay {
    store: Arc<dyn ObjectStore>,
    /// Shared by every session so the limit is process-wide.
    permits: Arc<Semaphore>,
    category: String,
    max_bytes: usize,
}

impl UploadRelay {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_UPLOADS)),
            category: DEFAULT_UPLOAD_CATEGORY.to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Result<Self, CoreError> {
        if max_concurrent == 0 {
            return Err(CoreError::Validation(
                "Max concurrent uploads must be at least 1".into(),
            ));
        }
        self.permits = Arc::new(Semaphore::new(max_concurrent));
        Ok(self)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check a whole selection without touching storage.
    ///
    /// Any invalid file rejects the entire selection.
    pub fn validate(&self, files: &[IncomingFile]) -> Result<Vec<ImageMime>, CoreError> {
        validate_file_count(files.len())?;
        files
            .iter()
            .map(|f| validate_image_upload(&f.file_name, &f.content_type, &f.bytes, self.max_bytes))
            .collect()
    }

    /// Validate then relay every file.
    ///
    /// An invalid selection is rejected before any storage call. Once
    /// validated, every file is attempted; the batch lists the stored files
    /// in selection order alongside the ones storage refused.
    pub async fn upload_all(&self, files: Vec<IncomingFile>) -> Result<UploadBatch, PipelineError> {
        let mimes = self.validate(&files)?;
        let uploads = files
            .into_iter()
            .zip(mimes)
            .enumerate()
            .map(|(index, (file, mime))| self.relay(index, file, mime));

        let mut batch = UploadBatch::default();
        for result in futures::future::join_all(uploads).await {
            match result {
                Ok(uploaded) => batch.uploaded.push(uploaded),
                Err(failure) => batch.failures.push(failure),
            }
        }
        Ok(batch)
    }

    async fn relay(
        &self,
        index: usize,
        file: IncomingFile,
        mime: ImageMime,
    ) -> Result<UploadedFile, UploadFailure> {
        let Ok(_permit) = self.permits.acquire().await else {
            return Err(UploadFailure::new(index, &file.file_name, "Upload semaphore closed"));
        };

        let key = object_key(&self.category, &file.file_name, mime);
        let size_bytes = file.bytes.len();
        let stored = self
            .store
            .put_public(StorageObject {
                key: key.clone(),
                content_type: mime.content_type(),
                bytes: file.bytes,
            })
            .await;
        let url = match stored {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(file_name = %file.file_name, %key, error = %e, "Upload failed");
                return Err(UploadFailure::new(index, &file.file_name, e.to_string()));
            }
        };

        tracing::info!(file_name = %file.file_name, %key, size_bytes, "Uploaded file");
        Ok(UploadedFile {
            file_name: file.file_name,
            content_type: mime,
            size_bytes,
            url,
            uploaded_at: chrono::Utc::now(),
        })
    }
}

/// One file of a selection that storage refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    /// Zero-based position of the file in the selection.
    pub index: usize,
    pub file_name: String,
    pub error: String,
}

impl UploadFailure {
    fn new(index: usize, file_name: &str, error: impl Into<String>) -> Self {
        Self {
            index,
            file_name: file_name.to_string(),
            error: error.into(),
        }
    }
}

/// Outcome of relaying a validated selection.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub uploaded: Vec<UploadedFile>,
    pub failures: Vec<UploadFailure>,
}

impl UploadBatch {
    /// The stored files, or an error naming every file that failed.
    pub fn into_result(self) -> Result<Vec<UploadedFile>, PipelineError> {
        if self.failures.is_empty() {
            return Ok(self.uploaded);
        }
        Err(PipelineError::Upload {
            uploaded: self.uploaded.len(),
            failures: self.failures,
        })
    }
}
