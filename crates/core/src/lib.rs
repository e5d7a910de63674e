//! Domain types and pure logic for synthetic data generation.
//!
//! No I/O lives here: provider clients are in `synthgen-providers` and the
//! orchestration in `synthgen-pipeline`.

pub mod batch;
pub mod busy;
pub mod error;
pub mod mode;
pub mod prompt;
pub mod status;
pub mod types;
pub mod upload;
