//! Bridge session model.
//!
//! One session per browser, created when a client application initiates a
//! federated login and kept until it expires. The record walks through three
//! phases: empty (cookie issued, nothing stored), pending (login initiated,
//! waiting for the identity provider to post back), and authenticated
//! (assertion accepted, identity derived).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw assertion payload as handed back by the SAML provider.
///
/// Opaque to the bridge; only the provider knows how to read attributes out
/// of it. Kept on the session for traceability.
pub type AssertionDocument = serde_json::Value;

/// Requested OAuth2 grant shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Implicit grant: access token delivered in the redirect fragment.
    Token,
    /// Authorization code flow: short-lived code delivered in the query.
    Code,
}

impl ResponseType {
    /// Parses the wire form (`token` or `code`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "token" => Some(Self::Token),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    /// Returns the wire form of this response type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Code => "code",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity record handed to the authorization server for grant issuance.
///
/// Combines the bridge-stamped routing fields with whatever identity claims
/// the SAML provider extracted from the assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// URL-escaped authenticated user id, taken from the mapped profile.
    pub authenticated_userid: String,
    /// Target API the grant is scoped to.
    pub api_id: String,
    /// OAuth2 client the grant is issued for.
    pub client_id: String,
    /// Identifier of the bridge instance that authenticated the user.
    pub auth_server: String,
    /// Provider-supplied identity claims (subject, email, groups, ...).
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// Phase of the login flow a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No login has been initiated.
    Empty,
    /// Login initiated; waiting for the identity provider to post back.
    Pending,
    /// Assertion accepted; identity fields are populated.
    Authenticated,
}

/// A bridge session.
///
/// Keyed by an opaque identifier held in a signed cookie. All login state
/// lives here; request handling itself is stateless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    // === Identity ===
    /// Unique session identifier (cookie value).
    pub id: Uuid,

    // === Pending login ===
    /// Target API, set at initiate.
    pub api_id: Option<String>,
    /// OAuth2 client identifier, set at initiate.
    pub client_id: Option<String>,
    /// Requested grant shape, set at initiate.
    pub response_type: Option<ResponseType>,
    /// Client-supplied anti-CSRF value, echoed verbatim on the final
    /// redirect when present.
    pub state: Option<String>,
    /// Correlates this session's initiate with the matching assertion.
    pub request_id: Option<String>,

    // === Established identity ===
    /// Raw validated assertion, kept for traceability.
    pub saml_response: Option<AssertionDocument>,
    /// Identity record for the authorization server.
    pub user_info: Option<UserInfo>,
    /// Application-facing derived attributes.
    pub profile: Option<HashMap<String, String>>,

    // === Timestamps ===
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the assertion was accepted, if it was.
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Creates a new, empty session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            api_id: None,
            client_id: None,
            response_type: None,
            state: None,
            request_id: None,
            saml_response: None,
            user_info: None,
            profile: None,
            created_at: Utc::now(),
            authenticated_at: None,
        }
    }

    /// Derives the phase from which fields are populated.
    ///
    /// `user_info` and `profile` are set and cleared together, so either one
    /// marks the session authenticated; the pending fields are checked as a
    /// group because assertion processing requires all of them.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.user_info.is_some() && self.profile.is_some() {
            SessionPhase::Authenticated
        } else if self.request_id.is_some()
            && self.api_id.is_some()
            && self.client_id.is_some()
            && self.response_type.is_some()
        {
            SessionPhase::Pending
        } else {
            SessionPhase::Empty
        }
    }

    /// Records an initiated login, replacing any previous one.
    ///
    /// A fresh initiate invalidates identity derived from an earlier
    /// assertion; the session drops back to pending.
    pub fn begin_login(
        &mut self,
        api_id: impl Into<String>,
        client_id: impl Into<String>,
        response_type: ResponseType,
        state: Option<String>,
        request_id: impl Into<String>,
    ) {
        self.api_id = Some(api_id.into());
        self.client_id = Some(client_id.into());
        self.response_type = Some(response_type);
        self.state = state;
        self.request_id = Some(request_id.into());
        self.clear_identity();
    }

    /// Records an accepted assertion and the identity derived from it.
    pub fn complete_login(
        &mut self,
        assertion: AssertionDocument,
        user_info: UserInfo,
        profile: HashMap<String, String>,
    ) {
        self.saml_response = Some(assertion);
        self.user_info = Some(user_info);
        self.profile = Some(profile);
        self.authenticated_at = Some(Utc::now());
    }

    /// Drops the identity fields as a unit.
    ///
    /// Invariant: `user_info` and `profile` exist together or not at all;
    /// this is the only way either is removed.
    pub fn clear_identity(&mut self) {
        self.saml_response = None;
        self.user_info = None;
        self.profile = None;
        self.authenticated_at = None;
    }

    /// Checks if the session carries an established identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase(), SessionPhase::Authenticated)
    }

    /// Checks if the session has outlived the configured lifetime.
    #[must_use]
    pub fn is_expired(&self, lifetime: Duration) -> bool {
        Utc::now() - self.created_at > lifetime
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
