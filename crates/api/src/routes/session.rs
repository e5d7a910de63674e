use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{generation, session, upload};
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// POST   /                               create
/// GET    /{id}                           get_by_id
/// DELETE /{id}                           delete
/// PUT    /{id}/mode                      set_mode
/// PUT    /{id}/fields                    update_fields
/// POST   /{id}/generate/tabular          generate_tabular
/// POST   /{id}/generate/images           generate_images
/// POST   /{id}/uploads                   upload_files (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(session::create))
        .route("/{id}", get(session::get_by_id).delete(session::delete))
        .route("/{id}/mode", put(session::set_mode))
        .route("/{id}/fields", put(session::update_fields))
        .route("/{id}/generate/tabular", post(generation::generate_tabular))
        .route("/{id}/generate/images", post(generation::generate_images))
        .route("/{id}/uploads", post(upload::upload_files))
}
