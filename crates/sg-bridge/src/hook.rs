//! Authorization hook extension point.
//!
//! The one per-deployment seam in the flow: after an assertion is accepted
//! and the profile mapped, but before a grant is issued, the installed hook
//! may enrich the identity record (scopes, derived claims). The default does
//! nothing.

use std::collections::HashMap;

use async_trait::async_trait;
use sg_session::{AssertionDocument, AuthSession, UserInfo};

use crate::error::BridgeResult;

/// Read-only view of the flow state handed to an authorization hook.
#[derive(Debug)]
pub struct HookContext<'a> {
    /// Profile derived by the mapper for this assertion.
    pub profile: &'a HashMap<String, String>,
    /// Raw assertion document as validated by the SAML provider.
    pub assertion: &'a AssertionDocument,
    /// The session driving this flow.
    pub session: &'a AuthSession,
}

/// Enriches the identity record before grant issuance.
///
/// Called exactly once per accepted assertion. An error aborts the flow and
/// is surfaced to the caller verbatim. Hooks must not carry side effects on
/// session state; a changed identity is returned, not written.
#[async_trait]
pub trait AuthorizationHook: Send + Sync + 'static {
    /// Returns the (possibly modified) identity to issue the grant for.
    async fn apply(&self, user_info: UserInfo, ctx: HookContext<'_>) -> BridgeResult<UserInfo>;
}

/// Default hook: returns the identity unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughHook;

#[async_trait]
impl AuthorizationHook for PassthroughHook {
    async fn apply(&self, user_info: UserInfo, _ctx: HookContext<'_>) -> BridgeResult<UserInfo> {
        Ok(user_info)
    }
}
