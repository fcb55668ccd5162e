use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::info;

use crate::lib::errors::SessionError;

use super::{SessionId, SessionTransport};

/// Process-wide map from session id to its live transport.
///
/// Entries are inserted by the broker after an `initialize` request and removed
/// by `close`, idle eviction, or the transport's own service task when it ends.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<SessionTransport>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport. Fails if its id is already present.
    pub async fn insert(&self, transport: Arc<SessionTransport>) -> Result<(), SessionError> {
        let id = transport.id().clone();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(SessionError::Duplicate { id: id.to_string() });
        }
        sessions.insert(id.clone(), transport);
        info!(
            target: "weather_mcp::session",
            session_id = %id,
            live_sessions = sessions.len(),
            "Registered MCP session"
        );
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Arc<SessionTransport>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    /// Remove an entry; `None` when the id is unknown.
    pub async fn remove(&self, id: &str) -> Option<Arc<SessionTransport>> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id);
        if removed.is_some() {
            info!(
                target: "weather_mcp::session",
                session_id = id,
                live_sessions = sessions.len(),
                "Removed MCP session"
            );
        }
        removed
    }

    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove and return every entry.
    pub async fn drain(&self) -> Vec<Arc<SessionTransport>> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, transport)| transport).collect()
    }

    /// Ids of sessions with no activity for at least `max_idle`.
    pub async fn idle_sessions(&self, max_idle: Duration) -> Vec<SessionId> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|transport| transport.idle_for() >= max_idle)
            .map(|transport| transport.id().clone())
            .collect()
    }
}
