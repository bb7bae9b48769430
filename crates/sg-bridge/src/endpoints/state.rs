//! Bridge endpoint state.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sg_session::SessionStore;

use crate::config::BridgeConfig;
use crate::flow::BridgeFlow;
use crate::origins::OriginAllowList;

/// Shared state for the bridge endpoints.
#[derive(Clone)]
pub struct BridgeState {
    /// The state machine driving the login flow.
    pub flow: Arc<BridgeFlow>,
    /// Session storage, keyed by the cookie's session id.
    pub sessions: Arc<dyn SessionStore>,
    /// Origins trusted for cross-origin session reads.
    pub origins: Arc<OriginAllowList>,
    /// Endpoint and cookie configuration.
    pub config: BridgeConfig,
    /// Key signing the session cookie.
    pub cookie_key: Key,
}

impl BridgeState {
    /// Creates the endpoint state.
    pub fn new(
        flow: Arc<BridgeFlow>,
        sessions: Arc<dyn SessionStore>,
        origins: Arc<OriginAllowList>,
        config: BridgeConfig,
        cookie_key: Key,
    ) -> Self {
        Self { flow, sessions, origins, config, cookie_key }
    }
}

// Lets SignedCookieJar find its signing key during extraction.
impl FromRef<BridgeState> for Key {
    fn from_ref(state: &BridgeState) -> Self {
        state.cookie_key.clone()
    }
}
