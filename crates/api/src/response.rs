//! Success envelope for the session API.

use serde::Serialize;

/// Every successful JSON response is `{ "data": T }`; errors use
/// `{ "error", "code" }` instead (see [`crate::error::AppError`]).
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
