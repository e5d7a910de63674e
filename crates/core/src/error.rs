#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Another operation already holds the session's busy flag.
    #[error("Busy: {0} is already in progress")]
    Busy(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}
