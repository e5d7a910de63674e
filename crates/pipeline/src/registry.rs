use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use synthgen_core::error::CoreError;
use synthgen_core::types::SessionId;
use tokio::sync::RwLock;

use crate::session::Session;

/// In-memory table of live sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        tracing::debug!(session_id = %session.id(), "Session created");
        session
    }

    pub async fn get(&self, id: SessionId) -> Result<Arc<Session>, CoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Session",
                id: id.to_string(),
            })
    }

    pub async fn remove(&self, id: SessionId) -> Result<(), CoreError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound {
                entity: "Session",
                id: id.to_string(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for longer than `max_idle`. Busy sessions are kept.
    ///
    /// Returns how many were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let candidates: Vec<Arc<Session>> = self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in candidates {
            if !session.is_busy() && session.last_active().await < cutoff {
                expired.push(session.id());
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &expired {
            sessions.remove(id);
        }
        tracing::info!(removed = expired.len(), remaining = sessions.len(), "Pruned idle sessions");
        expired.len()
    }
}
