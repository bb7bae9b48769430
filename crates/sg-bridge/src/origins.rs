//! Origin allow-list.
//!
//! Every time a grant redirect is issued, the redirect URI's web origin is
//! recorded here; the CORS layer on the session query endpoints only mirrors
//! origins found in this list. Entries carry a recorded-at timestamp and age
//! out after the session lifetime, refreshed on every issuance, so an origin
//! with live sessions never expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use url::Url;

/// Set of origins trusted for cross-origin session reads.
///
/// Shared across all sessions; concurrent recorders merge into the same map
/// without losing entries.
#[derive(Debug)]
pub struct OriginAllowList {
    entries: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
}

impl OriginAllowList {
    /// Creates an empty allow-list whose entries expire `ttl` after their
    /// last record.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Records the web origin of a redirect URI, refreshing it if already
    /// present.
    ///
    /// Best-effort: trust registration must never block a redirect, so an
    /// unparseable URI or one without a web origin is logged and dropped.
    pub fn record(&self, uri: &str) {
        match Url::parse(uri) {
            Ok(url) => {
                let origin = url.origin();
                if !origin.is_tuple() {
                    tracing::warn!(uri, "redirect URI has no web origin; not recorded");
                    return;
                }
                let origin = origin.ascii_serialization();
                tracing::debug!(origin = %origin, "origin recorded for cross-origin reads");
                self.entries.insert(origin, Utc::now());
            }
            Err(error) => {
                tracing::warn!(uri, %error, "unparseable redirect URI; origin not recorded");
            }
        }
    }

    /// Checks an `Origin` header value against the recorded set.
    ///
    /// Exact string match; unknown origins are denied. Expired entries are
    /// dropped on the way out.
    pub fn is_allowed(&self, origin: &str) -> bool {
        let expired = match self.entries.get(origin) {
            Some(entry) => Utc::now() - *entry.value() > self.ttl,
            None => return false,
        };
        if expired {
            // The read guard above is released by now; removing under it
            // would deadlock the shard.
            self.entries.remove(origin);
            return false;
        }
        true
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        self.entries.retain(|_, recorded| now - *recorded <= self.ttl);
        before - self.entries.len()
    }

    /// Number of currently recorded origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if no origins are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns a background task sweeping expired entries on a fixed period.
    pub fn spawn_sweeper(list: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            // First tick fires immediately; skip it so a fresh start does
            // no work.
            tick.tick().await;
            loop {
                tick.tick().await;
                let dropped = list.sweep();
                if dropped > 0 {
                    tracing::debug!(dropped, "expired origins swept");
                }
            }
        })
    }
}
