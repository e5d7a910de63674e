//! Handlers for session lifecycle and the mode controller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use synthgen_core::mode::{GenerationMode, ImageFields, TabularFields};
use synthgen_core::types::SessionId;
use synthgen_pipeline::SessionSnapshot;

use super::find_session;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
}

/// Either or both modes' fields. Omitted modes are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateFieldsRequest {
    pub tabular: Option<TabularFields>,
    pub image: Option<ImageFields>,
}

/// POST /api/v1/sessions
pub async fn create(
    State(state): State<AppState>,
) -> (StatusCode, Json<DataResponse<SessionSnapshot>>) {
    let session = state.sessions.create().await;
    let snapshot = session.snapshot().await;
    (StatusCode::CREATED, Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/sessions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let session = find_session(&state, id).await?;
    Ok(Json(DataResponse {
        data: session.snapshot().await,
    }))
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<StatusCode> {
    state.sessions.remove(id).await?;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/{id}/mode
pub async fn set_mode(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<SetModeRequest>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let mode = GenerationMode::from_name(&input.mode)?;
    let session = find_session(&state, id).await?;
    session.set_mode(mode).await;
    tracing::debug!(session_id = %id, %mode, "Mode switched");
    Ok(Json(DataResponse {
        data: session.snapshot().await,
    }))
}

/// PUT /api/v1/sessions/{id}/fields
pub async fn update_fields(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<UpdateFieldsRequest>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let session = find_session(&state, id).await?;
    if let Some(tabular) = input.tabular {
        session.set_tabular_fields(tabular).await?;
    }
    if let Some(image) = input.image {
        session.set_image_fields(image).await?;
    }
    Ok(Json(DataResponse {
        data: session.snapshot().await,
    }))
}
