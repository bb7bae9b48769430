//! Session store trait.
//!
//! Durable key-value persistence for [`AuthSession`] records. Stores apply
//! the configured session lifetime themselves: an expired record is treated
//! as absent on load and physically removed by [`purge_expired`].
//!
//! [`purge_expired`]: SessionStore::purge_expired

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SessionResult;
use crate::session::AuthSession;

/// Persistence for bridge sessions.
///
/// Implementations serialize access per key; the bridge relies on that
/// instead of cross-request locking.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Loads a session by id.
    ///
    /// Returns `None` for unknown ids and for sessions past their lifetime;
    /// expired records are dropped on the way out.
    async fn load(&self, id: Uuid) -> SessionResult<Option<AuthSession>>;

    /// Persists a session under its own id, replacing any previous record.
    async fn save(&self, session: &AuthSession) -> SessionResult<()>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn delete(&self, id: Uuid) -> SessionResult<()>;

    /// Removes all expired sessions, returning how many were dropped.
    async fn purge_expired(&self) -> SessionResult<u64>;
}
