use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::schema::Filters;

/// Per-session filter memory.
///
/// The orchestrator only needs read and overwrite; backends decide where the
/// state lives (process memory for tests and single-node runs, an external
/// store otherwise).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Filters last committed for `session_id`, or `None` for a new session.
    async fn get(&self, session_id: &str) -> Result<Option<Filters>>;
    /// Replace the committed filters for `session_id`.
    async fn put(&self, session_id: &str, filters: Filters) -> Result<()>;
}

/// Process-local session store.  Sessions live until the process exits.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Filters>>,
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
    async fn get(&self, session_id: &str) -> Result<Option<Filters>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn put(&self, session_id: &str, filters: Filters) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), filters);
        Ok(())
    }
}
