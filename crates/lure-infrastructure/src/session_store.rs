//! In-memory session store.

use async_trait::async_trait;
use lure_core::error::Result;
use lure_core::session::{SessionHandle, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keyed table of session handles held in process memory.
///
/// The map lock only guards membership; each session is serialized by its
/// own handle, so lookups never wait on a session's work.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionHandle>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn insert_if_absent(&self, handle: SessionHandle) -> Result<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .entry(handle.id().to_string())
            .or_insert(handle)
            .clone();
        Ok(stored)
    }

    async fn remove(&self, session_id: &str) -> Result<Option<SessionHandle>> {
        Ok(self.sessions.write().await.remove(session_id))
    }

    async fn list_all(&self) -> Result<Vec<SessionHandle>> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}
