//! Token renewal endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::SignedCookieJar;
use serde_json::json;

use crate::error::{BridgeError, BridgeResult};

use super::cookie::load_session;
use super::state::BridgeState;

/// `GET /heartbeat` — re-issues the implicit grant for an authenticated
/// session and returns the token parameters parsed from its redirect
/// fragment, `{access_token, expires_in, token_type}`-shaped.
///
/// Renewal does not re-run the assertion and is only allowed within the
/// configured window after it; outside the window the client has to
/// authenticate again.
pub async fn heartbeat(
    State(state): State<BridgeState>,
    jar: SignedCookieJar,
) -> BridgeResult<Response> {
    let Some(session) = load_session(&state, &jar).await? else {
        return Ok(no_session());
    };
    let Some(user_info) = session.user_info.clone() else {
        return Ok(no_session());
    };

    if !state.flow.within_heartbeat_window(&session) {
        return Ok(message_response(
            StatusCode::FORBIDDEN,
            "Renewal window expired. Cannot renew access token.".to_string(),
        ));
    }

    match state.flow.renew_token(&user_info).await {
        Ok(payload) => Ok(Json(payload).into_response()),
        Err(error) => {
            tracing::error!(session = %session.id, %error, "token renewal failed");
            let message = match &error {
                BridgeError::RedirectParse(_) => error.to_string(),
                _ => format!("Failed to renew access token: {error}"),
            };
            Ok(message_response(StatusCode::INTERNAL_SERVER_ERROR, message))
        }
    }
}

fn no_session() -> Response {
    message_response(
        StatusCode::FORBIDDEN,
        "No session available. Cannot renew access token.".to_string(),
    )
}

fn message_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
