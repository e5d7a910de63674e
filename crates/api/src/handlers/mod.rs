pub mod generation;
pub mod session;
pub mod ui;
pub mod upload;

use std::sync::Arc;

use synthgen_core::types::SessionId;
use synthgen_pipeline::Session;

use crate::error::AppResult;
use crate::state::AppState;

/// Look up a session or fail with 404.
pub(crate) async fn find_session(state: &AppState, id: SessionId) -> AppResult<Arc<Session>> {
    Ok(state.sessions.get(id).await?)
}
