//! Session state and the operations that drive the external services.
//!
//! [`Orchestrator`] issues generation calls, [`UploadRelay`] forwards user
//! files to storage, and [`Session`] ties both to one user's form state and
//! busy flag. [`SessionRegistry`] keeps the live sessions.

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod relay;
pub mod session;

pub use error::PipelineError;
pub use orchestrator::{ImageBatchOutcome, Orchestrator};
pub use registry::SessionRegistry;
pub use relay::{IncomingFile, UploadBatch, UploadFailure, UploadRelay};
pub use session::{ResultView, Session, SessionSnapshot};
