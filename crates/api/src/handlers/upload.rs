use axum::extract::{Multipart, Path, State};
use axum::Json;
use synthgen_core::types::SessionId;
use synthgen_core::upload::{validate_file_count, UploadedFile, MAX_FILES_PER_UPLOAD};
use synthgen_pipeline::IncomingFile;

use super::find_session;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sessions/{id}/uploads
///
/// Accepts a multipart form with one or more `files` fields (at most
/// [`MAX_FILES_PER_UPLOAD`]). Every file is validated before any is sent to
/// storage; the response lists the public URL of each, in form order.
pub async fn upload_files(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<Vec<UploadedFile>>>> {
    let session = find_session(&state, id).await?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("files") {
            continue; // ignore unknown fields
        }
        if files.len() == MAX_FILES_PER_UPLOAD {
            validate_file_count(files.len() + 1)?;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push(IncomingFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let uploaded = session.upload(&state.relay, files).await?;
    Ok(Json(DataResponse { data: uploaded }))
}
