//! Keyed session memory
//!
//! Access is explicit: the store is injected into the agent at
//! construction, scoped by `(user_id, session_id)`, and provides
//! read-your-writes consistency per key.

mod store;

pub use store::{MessageRole, SessionHistory, TurnMessage};

use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Trait for session-scoped conversation persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<SessionHistory>>;
    async fn put(&self, history: SessionHistory) -> Result<()>;
}

/// In-memory session store for development
pub struct InMemorySessionStore {
    histories: Arc<RwLock<HashMap<(Uuid, Uuid), SessionHistory>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            histories: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<SessionHistory>> {
        let histories = self.histories.read().await;
        Ok(histories.get(&(user_id, session_id)).cloned())
    }

    async fn put(&self, history: SessionHistory) -> Result<()> {
        let mut histories = self.histories.write().await;
        histories.insert((history.user_id, history.session_id), history);
        Ok(())
    }
}
