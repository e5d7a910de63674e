//! One user's form session.
//!
//! A [`Session`] owns the mode controller, the latest result of each
//! operation, and the busy flag shared by generation and uploads. Every
//! operation follows the same shape:
//!
//! 1. raise the busy flag (rejecting re-entrant submits);
//! 2. snapshot the inputs and mark the operation running, then release the lock;
//! 3. await the outbound call with no lock held;
//! 4. on success replace the stored result, on failure keep it and record the error.
//!
//! An operation dropped mid-flight (request timeout, client disconnect) is
//! recorded as failed, so a status is never left `Running` once the busy
//! flag clears.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use synthgen_core::batch::BatchFailure;
use synthgen_core::busy::BusyFlag;
use synthgen_core::error::CoreError;
use synthgen_core::mode::{ActiveFields, GenerationMode, ImageFields, ModeController, TabularFields};
use synthgen_core::prompt::TabularRequest;
use synthgen_core::status::{OperationKind, OperationStatus};
use synthgen_core::types::{SessionId, Timestamp};
use synthgen_core::upload::UploadedFile;
use tokio::sync::RwLock;

use crate::error::PipelineError;
use crate::orchestrator::{ImageBatchOutcome, Orchestrator};
use crate::relay::{IncomingFile, UploadRelay};

#[derive(Debug, Default)]
struct SessionState {
    modes: ModeController,
    generated_text: Option<String>,
    generated_images: Vec<String>,
    image_failures: Vec<BatchFailure>,
    uploads: Vec<UploadedFile>,
    tabular_status: OperationStatus,
    images_status: OperationStatus,
    upload_status: OperationStatus,
}

impl SessionState {
    fn status_mut(&mut self, kind: OperationKind) -> &mut OperationStatus {
        match kind {
            OperationKind::GenerateTabular => &mut self.tabular_status,
            OperationKind::GenerateImages => &mut self.images_status,
            OperationKind::Upload => &mut self.upload_status,
        }
    }
}

pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    busy: BusyFlag,
    state: Arc<RwLock<SessionState>>,
    last_active: RwLock<Timestamp>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new_v4(),
            created_at: now,
            busy: BusyFlag::new(),
            state: Arc::new(RwLock::new(SessionState::default())),
            last_active: RwLock::new(now),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub async fn last_active(&self) -> Timestamp {
        *self.last_active.read().await
    }

    async fn touch(&self) {
        *self.last_active.write().await = Utc::now();
    }

    // -- Mode controller --------------------------------------------------

    pub async fn mode(&self) -> GenerationMode {
        self.state.read().await.modes.mode()
    }

    /// Switch the active mode. The other mode's fields are kept.
    pub async fn set_mode(&self, mode: GenerationMode) {
        self.state.write().await.modes.set_mode(mode);
        self.touch().await;
    }

    pub async fn set_tabular_fields(&self, fields: TabularFields) -> Result<(), CoreError> {
        fields.validate()?;
        self.state.write().await.modes.set_tabular(fields);
        self.touch().await;
        Ok(())
    }

    pub async fn set_image_fields(&self, fields: ImageFields) -> Result<(), CoreError> {
        fields.validate()?;
        self.state.write().await.modes.set_image(fields);
        self.touch().await;
        Ok(())
    }

    // -- Operations -------------------------------------------------------

    /// Generate synthetic tabular data from the stored tabular fields.
    pub async fn generate_tabular(&self, orchestrator: &Orchestrator) -> Result<String, PipelineError> {
        let kind = OperationKind::GenerateTabular;
        let _guard = self.busy.try_acquire(kind.name())?;
        let (request, running) = {
            let mut state = self.state.write().await;
            ensure_mode(&state, GenerationMode::Tabular)?;
            let fields = state.modes.tabular();
            let request = TabularRequest::new(fields.description.as_str(), fields.sample_data.as_str());
            (request, self.start(&mut state, kind))
        };
        self.touch().await;

        tracing::info!(session_id = %self.id, "Generating tabular data");
        let result = orchestrator.generate_tabular(&request).await;

        let mut state = self.state.write().await;
        running.finish();
        match &result {
            Ok(text) => {
                state.generated_text = Some(text.clone());
                *state.status_mut(kind) = OperationStatus::succeeded();
                tracing::info!(session_id = %self.id, len = text.len(), "Tabular data generated");
            }
            Err(e) => self.record_failure(&mut state, kind, e),
        }
        result
    }

    /// Generate the image batch from the stored image description.
    pub async fn generate_images(&self, orchestrator: &Orchestrator) -> Result<ImageBatchOutcome, PipelineError> {
        let kind = OperationKind::GenerateImages;
        let _guard = self.busy.try_acquire(kind.name())?;
        let (description, running) = {
            let mut state = self.state.write().await;
            ensure_mode(&state, GenerationMode::Image)?;
            let description = state.modes.image().description.clone();
            (description, self.start(&mut state, kind))
        };
        self.touch().await;

        tracing::info!(
            session_id = %self.id,
            policy = orchestrator.policy().name(),
            concurrency = orchestrator.concurrency(),
            "Generating images"
        );
        let result = orchestrator.generate_images(&description).await;

        let mut state = self.state.write().await;
        running.finish();
        match &result {
            Ok(outcome) => {
                state.generated_images = outcome.urls.clone();
                state.image_failures = outcome.failures.clone();
                *state.status_mut(kind) = OperationStatus::succeeded();
                tracing::info!(
                    session_id = %self.id,
                    images = outcome.urls.len(),
                    failed = outcome.failures.len(),
                    "Images generated"
                );
            }
            Err(e) => self.record_failure(&mut state, kind, e),
        }
        result
    }

    /// Relay a file selection to storage.
    ///
    /// Files that reached storage replace the stored list even when others
    /// in the selection failed; the operation then reports the failures.
    pub async fn upload(
        &self,
        relay: &UploadRelay,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<UploadedFile>, PipelineError> {
        let kind = OperationKind::Upload;
        let _guard = self.busy.try_acquire(kind.name())?;
        let running = self.start(&mut *self.state.write().await, kind);
        self.touch().await;

        tracing::info!(session_id = %self.id, files = files.len(), "Uploading files");
        let outcome = relay.upload_all(files).await;

        let mut state = self.state.write().await;
        running.finish();
        let result = outcome.and_then(|batch| {
            if !batch.uploaded.is_empty() {
                state.uploads = batch.uploaded.clone();
            }
            batch.into_result()
        });
        match &result {
            Ok(_) => *state.status_mut(kind) = OperationStatus::succeeded(),
            Err(e) => self.record_failure(&mut state, kind, e),
        }
        result
    }

    /// Mark `kind` running. The returned guard must be finished once the
    /// outcome is recorded.
    fn start(&self, state: &mut SessionState, kind: OperationKind) -> RunningGuard {
        let started_at = Utc::now();
        *state.status_mut(kind) = OperationStatus::Running { started_at };
        RunningGuard {
            state: Arc::clone(&self.state),
            session_id: self.id,
            kind,
            started_at,
            finished: false,
        }
    }

    fn record_failure(&self, state: &mut SessionState, kind: OperationKind, error: &PipelineError) {
        tracing::error!(
            session_id = %self.id,
            operation = kind.name(),
            error = %error,
            "Operation failed, keeping previous result"
        );
        *state.status_mut(kind) = OperationStatus::failed(error.to_string());
    }

    // -- Presentation -----------------------------------------------------

    /// The view of this session: fields and result of the active mode only.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        let result = match state.modes.mode() {
            GenerationMode::Tabular => ResultView::Tabular {
                text: state.generated_text.clone(),
                status: state.tabular_status.clone(),
                stale: state.tabular_status.is_stale() && state.generated_text.is_some(),
            },
            GenerationMode::Image => ResultView::Image {
                urls: state.generated_images.clone(),
                failures: state.image_failures.clone(),
                status: state.images_status.clone(),
                stale: state.images_status.is_stale() && !state.generated_images.is_empty(),
                uploads: state.uploads.clone(),
                upload_status: state.upload_status.clone(),
            },
        };
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            busy: self.busy.is_busy(),
            fields: state.modes.active_fields(),
            result,
        }
    }
}

const CANCELLED: &str = "Operation cancelled before completion";

/// Owns one operation's `Running` status.
///
/// Dropped without [`RunningGuard::finish`], it marks the operation failed.
/// It is declared after the busy guard so it drops first.
struct RunningGuard {
    state: Arc<RwLock<SessionState>>,
    session_id: SessionId,
    kind: OperationKind,
    started_at: Timestamp,
    finished: bool,
}

impl RunningGuard {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!(
            session_id = %self.session_id,
            operation = self.kind.name(),
            "Operation dropped before completion"
        );
        let (kind, started_at) = (self.kind, self.started_at);
        if let Ok(mut state) = self.state.try_write() {
            mark_cancelled(&mut state, kind, started_at);
            return;
        }
        // The lock is only ever held briefly; finish the reset once it frees.
        let state = Arc::clone(&self.state);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                mark_cancelled(&mut *state.write().await, kind, started_at);
            });
        }
    }
}

/// Fail the run that started at `started_at`, leaving any later run alone.
fn mark_cancelled(state: &mut SessionState, kind: OperationKind, started_at: Timestamp) {
    let status = state.status_mut(kind);
    if matches!(*status, OperationStatus::Running { started_at: t } if t == started_at) {
        *status = OperationStatus::failed(CANCELLED);
    }
}

/// Only the active mode may be submitted.
fn ensure_mode(state: &SessionState, expected: GenerationMode) -> Result<(), CoreError> {
    let active = state.modes.mode();
    if active != expected {
        return Err(CoreError::Validation(format!(
            "Session is in {active} mode, cannot generate {expected} output"
        )));
    }
    Ok(())
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub created_at: Timestamp,
    pub busy: bool,
    pub fields: ActiveFields,
    pub result: ResultView,
}

/// Result panel for the active mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResultView {
    Tabular {
        text: Option<String>,
        status: OperationStatus,
        /// A result is shown but the last attempt failed.
        stale: bool,
    },
    Image {
        urls: Vec<String>,
        failures: Vec<BatchFailure>,
        status: OperationStatus,
        stale: bool,
        uploads: Vec<UploadedFile>,
        upload_status: OperationStatus,
    },
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use synthgen_core::prompt::{DEFAULT_IMAGE_MODEL, IMAGE_BATCH_SIZE};
    use synthgen_providers::mock::{Gate, MockImageGenerator, MockObjectStore, MockTextGenerator};

    use super::*;

    fn orchestrator(text: MockTextGenerator, images: MockImageGenerator) -> Orchestrator {
        Orchestrator::new(Arc::new(text), Arc::new(images), DEFAULT_IMAGE_MODEL)
    }

    fn png(name: &str) -> IncomingFile {
        IncomingFile {
            file_name: name.into(),
            content_type: "image/png".into(),
            bytes: b"\x89PNG\r\n\x1a\n0000".to_vec(),
        }
    }

    fn tabular(description: &str, sample: &str) -> TabularFields {
        TabularFields {
            description: description.into(),
            sample_data: sample.into(),
        }
    }

    #[tokio::test]
    async fn switching_mode_keeps_other_fields() {
        let session = Session::new();
        session
            .set_tabular_fields(tabular("churn", "id\n1"))
            .await
            .unwrap();
        session
            .set_image_fields(ImageFields { description: "bike".into() })
            .await
            .unwrap();

        session.set_mode(GenerationMode::Image).await;
        assert_eq!(
            session.snapshot().await.fields,
            ActiveFields::Image(ImageFields { description: "bike".into() })
        );

        session.set_mode(GenerationMode::Tabular).await;
        assert_eq!(
            session.snapshot().await.fields,
            ActiveFields::Tabular(tabular("churn", "id\n1"))
        );
    }

    #[tokio::test]
    async fn customer_churn_scenario_stores_exact_text() {
        let reply = "id,age,churn\n1,34,0\n2,41,1\n3,29,0\n4,52,1";
        let text = Arc::new(MockTextGenerator::replying(reply));
        let orch = Orchestrator::new(text.clone(), Arc::new(MockImageGenerator::new()), DEFAULT_IMAGE_MODEL);
        let session = Session::new();
        session
            .set_tabular_fields(tabular("customer churn records", "id,age,churn\n1,34,0"))
            .await
            .unwrap();

        session.generate_tabular(&orch).await.unwrap();

        assert_eq!(text.calls(), 1);
        let prompt = &text.prompts()[0];
        assert!(prompt.contains("customer churn records"));
        assert!(prompt.contains("id,age,churn\n1,34,0"));
        assert!(prompt.contains("at least double the size"));

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Tabular { text: Some(t), stale: false, status: OperationStatus::Succeeded { .. } } if t == reply
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn failed_tabular_keeps_previous_text_and_marks_stale() {
        let session = Session::new();
        session
            .generate_tabular(&orchestrator(MockTextGenerator::replying("old"), MockImageGenerator::new()))
            .await
            .unwrap();

        let err = session
            .generate_tabular(&orchestrator(MockTextGenerator::failing("boom"), MockImageGenerator::new()))
            .await
            .unwrap_err();
        assert_matches!(err, PipelineError::TextGeneration(_));

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Tabular { text: Some(t), stale: true, status: OperationStatus::Failed { .. } } if t == "old"
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn failed_batch_stores_no_partial_sequence() {
        let session = Session::new();
        session.set_mode(GenerationMode::Image).await;
        let orch = orchestrator(
            MockTextGenerator::replying(""),
            MockImageGenerator::new().failing_on([6]),
        );

        session.generate_images(&orch).await.unwrap_err();

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Image { urls, stale: false, status: OperationStatus::Failed { .. }, .. } if urls.is_empty()
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn successful_batch_replaces_sequence() {
        let session = Session::new();
        session.set_mode(GenerationMode::Image).await;
        session
            .set_image_fields(ImageFields {
                description: "a red bicycle on a white background".into(),
            })
            .await
            .unwrap();

        let outcome = session
            .generate_images(&orchestrator(MockTextGenerator::replying(""), MockImageGenerator::new()))
            .await
            .unwrap();
        assert_eq!(outcome.urls.len(), IMAGE_BATCH_SIZE);

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Image { urls, .. } if urls == outcome.urls
        );
    }

    #[tokio::test]
    async fn busy_only_while_pending_and_rejects_reentry() {
        let gate = Gate::new();
        let orch = Arc::new(orchestrator(
            MockTextGenerator::failing("late failure").gated(gate.clone()),
            MockImageGenerator::new(),
        ));
        let session = Arc::new(Session::new());
        assert!(!session.is_busy());

        let task = {
            let (session, orch) = (Arc::clone(&session), Arc::clone(&orch));
            tokio::spawn(async move { session.generate_tabular(&orch).await })
        };
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(session.snapshot().await.busy);
        assert_matches!(
            session.generate_images(&orch).await,
            Err(PipelineError::Core(CoreError::Busy(_)))
        );

        gate.open();
        assert!(task.await.unwrap().is_err());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn dropped_generation_leaves_failed_status_and_clears_busy() {
        let gate = Gate::new();
        let orch = Arc::new(orchestrator(
            MockTextGenerator::replying("never seen").gated(gate.clone()),
            MockImageGenerator::new(),
        ));
        let session = Arc::new(Session::new());

        let task = {
            let (session, orch) = (Arc::clone(&session), Arc::clone(&orch));
            tokio::spawn(async move { session.generate_tabular(&orch).await })
        };
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let snapshot = session.snapshot().await;
        assert!(!snapshot.busy);
        assert_matches!(
            snapshot.result,
            ResultView::Tabular { text: None, stale: false, status: OperationStatus::Failed { error, .. } }
                if error == CANCELLED
        );

        // The session is usable again.
        let text = session
            .generate_tabular(&orchestrator(MockTextGenerator::replying("fresh"), MockImageGenerator::new()))
            .await
            .unwrap();
        assert_eq!(text, "fresh");
    }

    #[tokio::test]
    async fn dropped_upload_leaves_failed_upload_status() {
        let gate = Gate::new();
        let relay = Arc::new(UploadRelay::new(Arc::new(MockObjectStore::new().gated(gate.clone()))));
        let session = Arc::new(Session::new());
        session.set_mode(GenerationMode::Image).await;

        let task = {
            let (session, relay) = (Arc::clone(&session), Arc::clone(&relay));
            tokio::spawn(async move { session.upload(&relay, vec![png("cat.png")]).await })
        };
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        let snapshot = session.snapshot().await;
        assert!(!snapshot.busy);
        assert_matches!(
            snapshot.result,
            ResultView::Image { uploads, upload_status: OperationStatus::Failed { .. }, .. } if uploads.is_empty()
        );
    }

    #[tokio::test]
    async fn partial_upload_records_stored_files_and_fails() {
        let relay = UploadRelay::new(Arc::new(MockObjectStore::new().failing_for(["b.png"])));
        let session = Session::new();
        session.set_mode(GenerationMode::Image).await;

        let err = session
            .upload(&relay, vec![png("a.png"), png("b.png"), png("c.png")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'b.png'"));
        assert_matches!(err, PipelineError::Upload { uploaded: 2, failures } if failures[0].file_name == "b.png");

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Image { uploads, upload_status: OperationStatus::Failed { .. }, .. }
                if uploads.iter().map(|u| u.file_name.as_str()).collect::<Vec<_>>() == ["a.png", "c.png"]
        );
    }

    #[tokio::test]
    async fn upload_records_urls_in_image_view() {
        let relay = UploadRelay::new(Arc::new(MockObjectStore::new()));
        let session = Session::new();
        session.set_mode(GenerationMode::Image).await;

        let png = IncomingFile {
            file_name: "cat.png".into(),
            content_type: "image/png".into(),
            bytes: b"\x89PNG\r\n\x1a\n0000".to_vec(),
        };
        session.upload(&relay, vec![png]).await.unwrap();

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Image { uploads, upload_status: OperationStatus::Succeeded { .. }, .. } if uploads.len() == 1
        );
    }

    #[tokio::test]
    async fn failed_upload_sets_only_upload_status() {
        let relay = UploadRelay::new(Arc::new(MockObjectStore::failing()));
        let session = Session::new();
        session.set_mode(GenerationMode::Image).await;
        let png = IncomingFile {
            file_name: "cat.png".into(),
            content_type: "image/png".into(),
            bytes: b"\x89PNG\r\n\x1a\n0000".to_vec(),
        };

        session.upload(&relay, vec![png]).await.unwrap_err();

        assert_matches!(
            session.snapshot().await.result,
            ResultView::Image { status: OperationStatus::Idle, upload_status: OperationStatus::Failed { .. }, .. }
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn inactive_mode_cannot_be_submitted() {
        let images = Arc::new(MockImageGenerator::new());
        let orch = Orchestrator::new(
            Arc::new(MockTextGenerator::replying("")),
            images.clone(),
            DEFAULT_IMAGE_MODEL,
        );
        let session = Session::new();

        assert_matches!(
            session.generate_images(&orch).await,
            Err(PipelineError::Core(CoreError::Validation(_)))
        );
        assert_eq!(images.calls(), 0);
        assert!(!session.is_busy());
        assert_matches!(
            session.snapshot().await.result,
            ResultView::Tabular { status: OperationStatus::Idle, .. }
        );
    }

    #[tokio::test]
    async fn snapshot_serializes_with_mode_tags() {
        let session = Session::new();
        let json = serde_json::to_value(session.snapshot().await).unwrap();
        assert_eq!(json["fields"]["mode"], "tabular");
        assert_eq!(json["result"]["mode"], "tabular");
        assert_eq!(json["result"]["status"]["state"], "idle");
        assert_eq!(json["busy"], false);
    }
}
