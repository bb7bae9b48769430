//! Assertion consumer endpoint.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

use crate::error::{BridgeError, BridgeResult};
use crate::saml::AssertionPayload;

use super::cookie::{load_session, session_cookie};
use super::state::BridgeState;

/// Form body the identity provider posts back.
#[derive(Debug, Deserialize)]
pub struct AssertForm {
    /// Base64-encoded SAML response document.
    #[serde(rename = "SAMLResponse")]
    pub saml_response: Option<String>,
    /// Relay state echo, if the provider carries one.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// `POST /assert` — consumes the identity provider's assertion and redirects
/// the browser to the client application with the grant attached.
pub async fn assert_post(
    State(state): State<BridgeState>,
    jar: SignedCookieJar,
    Form(form): Form<AssertForm>,
) -> BridgeResult<Response> {
    let mut session = load_session(&state, &jar)
        .await?
        .ok_or_else(|| BridgeError::session_state("No session data available."))?;

    // An absent SAMLResponse goes through as-is; telling a well-formed
    // document from a hollow one is the provider's call.
    let payload = AssertionPayload {
        saml_response: form.saml_response.unwrap_or_default(),
        relay_state: form.relay_state,
    };

    let redirect_uri = state.flow.handle_assertion(&mut session, payload).await?;

    // Refresh the cookie alongside the redirect; the session outlives the
    // grant handoff so profile and heartbeat can read it.
    let jar = jar.add(session_cookie(&state.config, session.id));
    Ok((jar, Redirect::to(&redirect_uri)).into_response())
}
