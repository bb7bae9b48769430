//! Login initiation endpoint.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;

use crate::error::BridgeResult;
use crate::flow::LoginRequest;

use super::cookie::{load_session, session_cookie};
use super::state::BridgeState;

/// Query parameters of the initiate endpoint, all optional until validated.
#[derive(Debug, Deserialize)]
pub struct InitiateParams {
    /// OAuth2 client identifier.
    pub client_id: Option<String>,
    /// Requested grant shape (`token` or `code`).
    pub response_type: Option<String>,
    /// Informational redirect URI some clients send along.
    pub redirect_uri: Option<String>,
    /// Anti-CSRF state echo.
    pub state: Option<String>,
}

/// `GET /api/{api_id}` — validates the request, starts a login with the
/// identity provider and redirects the browser to its login URL.
pub async fn initiate(
    State(state): State<BridgeState>,
    jar: SignedCookieJar,
    Path(api_id): Path<String>,
    Query(params): Query<InitiateParams>,
) -> BridgeResult<Response> {
    let request = LoginRequest::from_query(
        api_id,
        params.client_id,
        params.response_type,
        params.redirect_uri,
        params.state,
    )?;

    // Reuse the browser's session when it already has one; the flow replaces
    // any previous pending login.
    let mut session = load_session(&state, &jar).await?.unwrap_or_default();

    let login_url = state.flow.begin_login(&mut session, request).await?;

    let jar = jar.add(session_cookie(&state.config, session.id));
    Ok((jar, Redirect::to(&login_url)).into_response())
}
