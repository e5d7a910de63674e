pub mod health;
pub mod session;
pub mod ui;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /sessions                                 create
/// /sessions/{id}                            snapshot, delete
/// /sessions/{id}/mode                       set mode (PUT)
/// /sessions/{id}/fields                     set form fields (PUT)
/// /sessions/{id}/generate/tabular           one text-generation call (POST)
/// /sessions/{id}/generate/images            image batch (POST)
/// /sessions/{id}/uploads                    relay files to storage (POST, multipart)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sessions", session::router())
}
