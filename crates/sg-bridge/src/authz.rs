//! Authorization server abstraction.
//!
//! The bridge does not mint tokens or codes itself. An [`AuthorizationServer`]
//! validates client subscriptions at login time and issues grants after a
//! successful assertion, returning the client redirect URI carrying the grant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sg_session::UserInfo;

use crate::error::BridgeResult;

/// A client application's subscription to an API, as recorded by the
/// authorization server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// API the client is subscribed to.
    pub api_id: String,
}

/// Issues OAuth2 grants on behalf of the bridge.
#[async_trait]
pub trait AuthorizationServer: Send + Sync + 'static {
    /// Confirms that `client_id` holds a subscription to `api_id`.
    ///
    /// An unknown client or API surfaces as the registry's own error; the
    /// bridge never starts a login it cannot finish.
    async fn lookup_subscription(
        &self,
        client_id: &str,
        api_id: &str,
    ) -> BridgeResult<Subscription>;

    /// Requests an implicit-grant redirect URI for an authenticated user.
    ///
    /// Returns `None` when the server answered without a redirect target;
    /// the caller decides how to surface that.
    async fn issue_implicit_grant(&self, user_info: &UserInfo) -> BridgeResult<Option<String>>;

    /// Requests an authorization-code redirect URI for an authenticated user.
    async fn issue_authorization_code(&self, user_info: &UserInfo)
        -> BridgeResult<Option<String>>;
}
