//! SAML provider abstraction.
//!
//! The bridge never parses SAML itself; a [`SamlProvider`] owns login URL
//! construction, response validation, and metadata rendering. The provider
//! returns assertions as opaque JSON documents, and interprets attribute
//! access over them so the bridge stays independent of the document layout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sg_session::AssertionDocument;

use crate::error::BridgeResult;

/// A dispatched login: where to send the browser, and the request id the
/// eventual assertion must echo back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginHandle {
    /// Absolute identity-provider URL the browser is redirected to.
    pub login_url: String,
    /// Correlation id for the in-flight authentication request.
    pub request_id: String,
}

/// The raw assertion submission posted back by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionPayload {
    /// Base64-encoded SAML response document, exactly as posted.
    pub saml_response: String,
    /// Relay state echoed by the identity provider, if any.
    pub relay_state: Option<String>,
}

/// A validated assertion: the identity claims the provider extracted, plus
/// the assertion document itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertedIdentity {
    /// Identity claims the provider derived (subject, email, ...). Merged
    /// into the user info record at issuance; the bridge stamps its own
    /// routing fields over them.
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
    /// Provider-shaped assertion document retained on the session.
    pub assertion: AssertionDocument,
}

/// Validates SAML exchanges on behalf of the bridge.
#[async_trait]
pub trait SamlProvider: Send + Sync + 'static {
    /// Starts a login for `client_id` against `api_id` and returns where to
    /// send the browser.
    async fn login(&self, api_id: &str, client_id: &str) -> BridgeResult<LoginHandle>;

    /// Validates a posted assertion against the pending `request_id`.
    ///
    /// Rejections (bad signature, wrong audience, replay) surface as
    /// [`BridgeError::AssertionRejected`](crate::BridgeError::AssertionRejected);
    /// transport faults as other 500-class variants.
    async fn assert(
        &self,
        payload: &AssertionPayload,
        request_id: &str,
    ) -> BridgeResult<AssertedIdentity>;

    /// Renders the service-provider metadata document.
    async fn metadata(&self) -> BridgeResult<String>;

    /// Names of the attributes carried by `assertion`.
    ///
    /// The default reads an `attributes` object at the document root,
    /// which matches what the stock provider emits.
    fn attribute_names(&self, assertion: &AssertionDocument) -> Vec<String> {
        assertion
            .get("attributes")
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Looks up a single attribute value by name.
    ///
    /// Multi-valued attributes yield their first entry; scalar non-string
    /// values are rendered as text.
    fn attribute_value(&self, assertion: &AssertionDocument, name: &str) -> Option<String> {
        let value = assertion.get("attributes")?.get(name)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_owned),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
