//! Partial-failure policy and concurrency bounds for image batches.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default number of image calls in flight at once (sequential).
pub const DEFAULT_IMAGE_CONCURRENCY: usize = 1;

/// Upper bound on image calls in flight at once.
pub const MAX_IMAGE_CONCURRENCY: usize = 10;

/// What to do when some calls of a batch fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// The first failure aborts the remaining calls; nothing is stored.
    #[default]
    AllOrNothing,
    /// Every call runs; successes are stored in request order and failures
    /// are reported by index.
    BestEffort,
}

impl BatchPolicy {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "all_or_nothing" => Ok(Self::AllOrNothing),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(CoreError::Validation(format!(
                "Unknown batch policy '{other}'. Must be one of: all_or_nothing, best_effort"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AllOrNothing => "all_or_nothing",
            Self::BestEffort => "best_effort",
        }
    }
}

/// Validate a requested image concurrency limit.
pub fn validate_concurrency(limit: usize) -> Result<(), CoreError> {
    if limit == 0 || limit > MAX_IMAGE_CONCURRENCY {
        return Err(CoreError::Validation(format!(
            "Image concurrency must be between 1 and {MAX_IMAGE_CONCURRENCY}, got {limit}"
        )));
    }
    Ok(())
}

/// One failed call inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Zero-based position of the call in the batch.
    pub index: usize,
    pub error: String,
}
