//! Handlers that trigger outbound generation.
//!
//! Both accept an optional JSON body holding the active mode's fields; when
//! present it replaces the stored fields before the submit, as a form post
//! would.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use synthgen_core::mode::{ImageFields, TabularFields};
use synthgen_core::types::SessionId;
use synthgen_pipeline::ImageBatchOutcome;

use super::find_session;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TabularResult {
    /// Raw model output, verbatim.
    pub text: String,
}

fn parse_optional_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

/// POST /api/v1/sessions/{id}/generate/tabular
pub async fn generate_tabular(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    body: Bytes,
) -> AppResult<Json<DataResponse<TabularResult>>> {
    let session = find_session(&state, id).await?;
    if let Some(fields) = parse_optional_body::<TabularFields>(&body)? {
        session.set_tabular_fields(fields).await?;
    }

    let text = session.generate_tabular(&state.orchestrator).await?;
    Ok(Json(DataResponse {
        data: TabularResult { text },
    }))
}

/// POST /api/v1/sessions/{id}/generate/images
pub async fn generate_images(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    body: Bytes,
) -> AppResult<Json<DataResponse<ImageBatchOutcome>>> {
    let session = find_session(&state, id).await?;
    if let Some(fields) = parse_optional_body::<ImageFields>(&body)? {
        session.set_image_fields(fields).await?;
    }

    let outcome = session.generate_images(&state.orchestrator).await?;
    Ok(Json(DataResponse { data: outcome }))
}
