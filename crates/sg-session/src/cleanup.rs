//! Background session cleanup.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::store::SessionStore;

/// Spawns a background task that periodically drops expired sessions.
///
/// Expired sessions are already invisible to [`SessionStore::load`]; the
/// sweep reclaims their storage. The returned handle can be aborted to stop
/// the task on shutdown.
pub fn spawn_cleanup_task(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; skip it so the sweep runs on
        // the configured cadence from startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session cleanup sweep failed"),
            }
        }
    })
}
