//! Session profile endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::SignedCookieJar;
use serde_json::json;

use crate::error::BridgeResult;

use super::cookie::load_session;
use super::state::BridgeState;

/// `GET /profile` — returns the derived profile of an authenticated session.
///
/// The no-session answer is deliberately HTTP 200 with a message body; the
/// client applications polling this endpoint treat it as a soft miss, not a
/// failure.
pub async fn get_profile(
    State(state): State<BridgeState>,
    jar: SignedCookieJar,
) -> BridgeResult<Response> {
    let session = load_session(&state, &jar).await?;
    let profile = session
        .as_ref()
        .filter(|s| s.user_info.is_some())
        .and_then(|s| s.profile.clone());

    Ok(match profile {
        Some(profile) => Json(profile).into_response(),
        None => (
            StatusCode::OK,
            Json(json!({"message": "No session available. Cannot retrieve profile."})),
        )
            .into_response(),
    })
}
