//! Durable session store backed by redb.
//!
//! Sessions are stored in a single embedded key-value table, keyed by the
//! session id and encoded as MessagePack. redb write transactions serialize
//! per-key access, which is the storage-layer guarantee the bridge relies on
//! instead of cross-request locking.

use std::path::Path;

use async_trait::async_trait;
use chrono::Duration;
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::session::AuthSession;
use crate::store::SessionStore;

const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("bridge_sessions");

/// Session store persisted to an embedded redb database file.
pub struct RedbSessionStore {
    db: Database,
    lifetime: Duration,
}

impl RedbSessionStore {
    /// Opens or creates the store at `path` with the given session lifetime.
    pub fn open(path: impl AsRef<Path>, lifetime: Duration) -> SessionResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage)?;
            }
        }

        let db = Database::create(path).map_err(storage)?;

        // Create the table up front so reads never race table creation.
        let txn = db.begin_write().map_err(storage)?;
        {
            let _ = txn.open_table(SESSIONS_TABLE).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;

        Ok(Self { db, lifetime })
    }

    fn fetch(&self, id: Uuid) -> SessionResult<Option<AuthSession>> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(SESSIONS_TABLE).map_err(storage)?;
        let key = id.to_string();
        match table.get(key.as_str()).map_err(storage)? {
            Some(bytes) => {
                let session = rmp_serde::from_slice(bytes.value())
                    .map_err(|e| SessionError::Serialization(e.to_string()))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> SessionResult<bool> {
        let txn = self.db.begin_write().map_err(storage)?;
        let removed = {
            let mut table = txn.open_table(SESSIONS_TABLE).map_err(storage)?;
            let removed = table.remove(key).map_err(storage)?.is_some();
            removed
        };
        txn.commit().map_err(storage)?;
        Ok(removed)
    }
}

fn storage(e: impl std::fmt::Display) -> SessionError {
    SessionError::Storage(e.to_string())
}

#[async_trait]
impl SessionStore for RedbSessionStore {
    async fn load(&self, id: Uuid) -> SessionResult<Option<AuthSession>> {
        match self.fetch(id)? {
            Some(session) if session.is_expired(self.lifetime) => {
                self.remove(id.to_string().as_str())?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, session: &AuthSession) -> SessionResult<()> {
        // Field-name encoding: the record nests flattened maps, and named
        // fields keep old records readable if the layout grows.
        let bytes = rmp_serde::to_vec_named(session)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(SESSIONS_TABLE).map_err(storage)?;
            let key = session.id.to_string();
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SessionResult<()> {
        self.remove(id.to_string().as_str())?;
        Ok(())
    }

    async fn purge_expired(&self) -> SessionResult<u64> {
        // Collect first; redb does not allow removal inside a read scan.
        let stale: Vec<String> = {
            let txn = self.db.begin_read().map_err(storage)?;
            let table = txn.open_table(SESSIONS_TABLE).map_err(storage)?;
            let mut keys = Vec::new();
            for entry in table.iter().map_err(storage)? {
                let (key, value) = entry.map_err(storage)?;
                match rmp_serde::from_slice::<AuthSession>(value.value()) {
                    Ok(session) if session.is_expired(self.lifetime) => {
                        keys.push(key.value().to_string());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(key = key.value(), error = %e, "dropping undecodable session record");
                        keys.push(key.value().to_string());
                    }
                }
            }
            keys
        };

        let mut purged = 0u64;
        for key in &stale {
            if self.remove(key)? {
                purged += 1;
            }
        }
        Ok(purged)
    }
}
