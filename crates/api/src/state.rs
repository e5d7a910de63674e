use std::sync::Arc;

use synthgen_pipeline::{Orchestrator, SessionRegistry, UploadRelay};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live form sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Generation clients and batch settings.
    pub orchestrator: Arc<Orchestrator>,
    /// Storage client and the process-wide upload limit.
    pub relay: Arc<UploadRelay>,
}
