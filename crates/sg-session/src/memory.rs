//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SessionResult;
use crate::session::AuthSession;
use crate::store::SessionStore;

/// In-memory session store for tests and single-node development.
///
/// Sessions do not survive a restart; production deployments should use
/// [`RedbSessionStore`](crate::RedbSessionStore).
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, AuthSession>>,
    lifetime: Duration,
}

impl MemorySessionStore {
    /// Creates an empty store with the given session lifetime.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime,
        }
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Checks if the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> SessionResult<Option<AuthSession>> {
        let found = self.sessions.read().await.get(&id).cloned();
        match found {
            Some(session) if session.is_expired(self.lifetime) => {
                self.sessions.write().await.remove(&id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, session: &AuthSession) -> SessionResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SessionResult<()> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }

    async fn purge_expired(&self) -> SessionResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.lifetime));
        Ok((before - sessions.len()) as u64)
    }
}
