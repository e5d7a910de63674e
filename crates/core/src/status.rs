//! Per-operation outcome tracking.
//!
//! Each operation kind carries its own [`OperationStatus`] so the
//! presentation layer can tell "no result yet" apart from "last attempt
//! failed, the shown result is stale".

use serde::Serialize;

use crate::types::Timestamp;

/// The operations a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    GenerateTabular,
    GenerateImages,
    Upload,
}

impl OperationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::GenerateTabular => "generate_tabular",
            Self::GenerateImages => "generate_images",
            Self::Upload => "upload",
        }
    }
}

/// Lifecycle of the most recent attempt of one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationStatus {
    /// Never attempted in this session.
    #[default]
    Idle,
    Running {
        started_at: Timestamp,
    },
    Succeeded {
        finished_at: Timestamp,
    },
    /// The last attempt failed; any stored result predates it.
    Failed {
        error: String,
        finished_at: Timestamp,
    },
}

impl OperationStatus {
    pub fn running() -> Self {
        Self::Running {
            started_at: chrono::Utc::now(),
        }
    }

    pub fn succeeded() -> Self {
        Self::Succeeded {
            finished_at: chrono::Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
            finished_at: chrono::Utc::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Whether a displayed result should be flagged as stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
