//! Session cookie helpers.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use sg_session::AuthSession;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

use super::state::BridgeState;

/// Builds the signed session cookie for a session id.
#[must_use]
pub fn session_cookie(config: &BridgeConfig, id: Uuid) -> Cookie<'static> {
    // The identity provider posts the assertion from its own origin, and
    // browsers strip cross-site cookies unless SameSite=None. None requires
    // Secure, so plain-HTTP dev deployments fall back to Lax.
    let same_site = if config.cookie_secure { SameSite::None } else { SameSite::Lax };
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site)
        .max_age(config.cookie_max_age())
        .build()
}

/// Reads the session id out of the signed jar, if one is present and valid.
///
/// A cookie that fails signature verification never shows up in the jar, so
/// a tampered cookie and a missing one look the same here.
#[must_use]
pub fn session_id(jar: &SignedCookieJar, config: &BridgeConfig) -> Option<Uuid> {
    jar.get(&config.cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Loads the session referenced by the jar's cookie.
///
/// Expired sessions are hidden by the store, so callers see them as absent.
pub async fn load_session(
    state: &BridgeState,
    jar: &SignedCookieJar,
) -> BridgeResult<Option<AuthSession>> {
    match session_id(jar, &state.config) {
        Some(id) => state.sessions.load(id).await.map_err(BridgeError::from),
        None => Ok(None),
    }
}
