//! The authentication state machine.
//!
//! Sequences the three-leg flow: initiate (subscription check, login
//! dispatch, session write), assert (validation, profile derivation,
//! authorization hook, grant issuance) and heartbeat renewal. Every
//! collaborator call runs under a deadline; the original sequencing is
//! preserved exactly, including the failure edge that drops a session's
//! identity fields while keeping the pending login intact.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use sg_session::{AuthSession, ResponseType, SessionStore, UserInfo};

use crate::authz::AuthorizationServer;
use crate::error::{BridgeError, BridgeResult};
use crate::hook::{AuthorizationHook, HookContext};
use crate::origins::OriginAllowList;
use crate::profile::ProfileMapper;
use crate::redirect::{self, TokenPayload};
use crate::saml::{AssertionPayload, SamlProvider};

/// Tuning for the state machine.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Static identifier stamped into `user_info.auth_server`, naming the
    /// bridge instance that authenticated the user.
    pub auth_server: String,
    /// Deadline for any single collaborator call.
    pub upstream_timeout: std::time::Duration,
    /// How long after an accepted assertion a heartbeat may still renew
    /// the grant.
    pub heartbeat_window: chrono::Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            auth_server: "auth-saml".to_string(),
            upstream_timeout: std::time::Duration::from_secs(10),
            heartbeat_window: chrono::Duration::minutes(60),
        }
    }
}

/// Validated inputs of an initiate call.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Target API from the request path.
    pub api_id: String,
    /// OAuth2 client identifier.
    pub client_id: String,
    /// Requested grant shape.
    pub response_type: ResponseType,
    /// Informational redirect URI some clients send along; logged, never
    /// used for issuance. The authorization server knows the registered one.
    pub redirect_uri: Option<String>,
    /// Anti-CSRF state echoed on the final redirect.
    pub state: Option<String>,
}

impl LoginRequest {
    /// Validates raw query input into a login request.
    ///
    /// Empty strings count as missing; a login must never reach the
    /// identity provider with half a request.
    pub fn from_query(
        api_id: impl Into<String>,
        client_id: Option<String>,
        response_type: Option<String>,
        redirect_uri: Option<String>,
        state: Option<String>,
    ) -> BridgeResult<Self> {
        let client_id = client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BridgeError::client("The query parameter client_id is missing."))?;
        let response_type = response_type
            .filter(|rt| !rt.is_empty())
            .ok_or_else(|| BridgeError::client("The query parameter response_type is missing."))?;
        let response_type = ResponseType::parse(&response_type).ok_or_else(|| {
            BridgeError::client("Invalid response_type; must be \"token\" or \"code\".")
        })?;

        Ok(Self {
            api_id: api_id.into(),
            client_id,
            response_type,
            redirect_uri: redirect_uri.filter(|uri| !uri.is_empty()),
            state: state.filter(|s| !s.is_empty()),
        })
    }
}

/// Drives the login flow against the configured collaborators.
pub struct BridgeFlow {
    saml: Arc<dyn SamlProvider>,
    authz: Arc<dyn AuthorizationServer>,
    hook: Arc<dyn AuthorizationHook>,
    mapper: ProfileMapper,
    origins: Arc<OriginAllowList>,
    sessions: Arc<dyn SessionStore>,
    settings: FlowSettings,
}

impl BridgeFlow {
    /// Wires the state machine to its collaborators.
    pub fn new(
        saml: Arc<dyn SamlProvider>,
        authz: Arc<dyn AuthorizationServer>,
        hook: Arc<dyn AuthorizationHook>,
        mapper: ProfileMapper,
        origins: Arc<OriginAllowList>,
        sessions: Arc<dyn SessionStore>,
        settings: FlowSettings,
    ) -> Self {
        Self { saml, authz, hook, mapper, origins, sessions, settings }
    }

    /// Runs the initiate leg and returns the identity-provider URL to send
    /// the browser to.
    ///
    /// Ordering is fixed: subscription lookup, then login dispatch, then
    /// the session write. The session is only persisted once a login is
    /// actually underway, so a failed lookup leaves no half-initiated state.
    pub async fn begin_login(
        &self,
        session: &mut AuthSession,
        request: LoginRequest,
    ) -> BridgeResult<String> {
        if let Some(uri) = &request.redirect_uri {
            tracing::debug!(redirect_uri = %uri, "client sent informational redirect_uri");
        }

        let subscription = self
            .deadline(
                "subscription lookup",
                self.authz.lookup_subscription(&request.client_id, &request.api_id),
            )
            .await?;
        tracing::debug!(
            client_id = %subscription.client_id,
            api_id = %subscription.api_id,
            "subscription confirmed"
        );

        let handle = self
            .deadline("login dispatch", self.saml.login(&request.api_id, &request.client_id))
            .await?;

        session.begin_login(
            request.api_id,
            request.client_id,
            request.response_type,
            request.state,
            handle.request_id,
        );
        self.sessions.save(session).await?;

        tracing::info!(session = %session.id, "login initiated");
        Ok(handle.login_url)
    }

    /// Runs the assert leg end to end and returns the final client redirect
    /// URI, `state` echo included.
    pub async fn handle_assertion(
        &self,
        session: &mut AuthSession,
        payload: AssertionPayload,
    ) -> BridgeResult<String> {
        // Precondition order matters: a missing request id means the post is
        // unrelated to any login we started (the sender's fault), while the
        // rest point at a corrupted session.
        let request_id = session
            .request_id
            .clone()
            .ok_or_else(|| BridgeError::client("Unrelated assertion received (no pending request)."))?;
        let api_id = session
            .api_id
            .clone()
            .ok_or_else(|| BridgeError::session_state("Unknown destination API."))?;
        let client_id = session
            .client_id
            .clone()
            .ok_or_else(|| BridgeError::session_state("Unknown destination client ID."))?;
        let response_type = session
            .response_type
            .ok_or_else(|| BridgeError::session_state("No response type."))?;

        let identity = match self
            .deadline("assertion validation", self.saml.assert(&payload, &request_id))
            .await
        {
            Ok(identity) => identity,
            Err(error) => {
                // Failure edge: the identity fields drop together, the
                // pending login stays. Provider detail goes to the log, the
                // caller gets an opaque rejection.
                session.clear_identity();
                self.sessions.save(session).await?;
                tracing::warn!(session = %session.id, %error, "assertion rejected");
                return Err(BridgeError::AssertionRejected(
                    "The SAML assertion could not be validated.".to_string(),
                ));
            }
        };

        let mut attributes = HashMap::new();
        for name in self.saml.attribute_names(&identity.assertion) {
            if let Some(value) = self.saml.attribute_value(&identity.assertion, &name) {
                attributes.insert(name, value);
            }
        }
        let profile = self.mapper.render(&attributes);

        let authenticated_userid = profile
            .get("authenticated_userid")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                BridgeError::internal("The profile mapping did not produce an authenticated_userid.")
            })?;
        let authenticated_userid = urlencoding::encode(authenticated_userid).into_owned();

        // Routing fields win over provider claims of the same name.
        let mut claims = identity.claims.clone();
        for key in ["authenticated_userid", "api_id", "client_id", "auth_server"] {
            claims.remove(key);
        }
        let user_info = UserInfo {
            authenticated_userid,
            api_id,
            client_id,
            auth_server: self.settings.auth_server.clone(),
            claims,
        };

        session.complete_login(identity.assertion.clone(), user_info.clone(), profile.clone());
        self.sessions.save(session).await?;

        let enriched = self
            .hook
            .apply(
                user_info.clone(),
                HookContext { profile: &profile, assertion: &identity.assertion, session },
            )
            .await?;
        if enriched != user_info {
            session.user_info = Some(enriched.clone());
            self.sessions.save(session).await?;
        }

        let redirect_uri = self.issue_redirect(&enriched, response_type).await?;
        let redirect_uri = redirect::append_state(redirect_uri, session.state.as_deref());

        tracing::info!(session = %session.id, response_type = %response_type, "grant issued");
        Ok(redirect_uri)
    }

    /// Re-issues an implicit grant from the stored identity and returns the
    /// token parameters parsed from its redirect fragment.
    ///
    /// Does not re-run the assertion; the authorization server decides
    /// whether the identity is still good for a token.
    pub async fn renew_token(&self, user_info: &UserInfo) -> BridgeResult<TokenPayload> {
        let redirect_uri = self.issue_redirect(user_info, ResponseType::Token).await?;
        redirect::parse_token_fragment(&redirect_uri)
    }

    /// Checks whether an authenticated session may still renew its grant.
    #[must_use]
    pub fn within_heartbeat_window(&self, session: &AuthSession) -> bool {
        match session.authenticated_at {
            Some(at) => Utc::now() - at <= self.settings.heartbeat_window,
            None => false,
        }
    }

    /// Fetches the service-provider metadata document.
    pub async fn metadata(&self) -> BridgeResult<String> {
        self.deadline("metadata render", self.saml.metadata()).await
    }

    /// Requests a grant redirect for the given shape and records its origin
    /// for cross-origin session reads.
    async fn issue_redirect(
        &self,
        user_info: &UserInfo,
        response_type: ResponseType,
    ) -> BridgeResult<String> {
        let issued = match response_type {
            ResponseType::Token => {
                self.deadline("implicit grant", self.authz.issue_implicit_grant(user_info)).await?
            }
            ResponseType::Code => {
                self.deadline(
                    "authorization code grant",
                    self.authz.issue_authorization_code(user_info),
                )
                .await?
            }
        };
        let redirect_uri = issued.ok_or_else(|| {
            BridgeError::Issuance(
                "Did not receive a redirect URI from the authorization server.".to_string(),
            )
        })?;

        self.origins.record(&redirect_uri);
        Ok(redirect_uri)
    }

    /// Bounds a collaborator call to the configured deadline.
    async fn deadline<T>(
        &self,
        what: &str,
        fut: impl Future<Output = BridgeResult<T>>,
    ) -> BridgeResult<T> {
        match tokio::time::timeout(self.settings.upstream_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::internal(format!(
                "{what} timed out after {:?}",
                self.settings.upstream_timeout
            ))),
        }
    }
}
