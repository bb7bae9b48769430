//! Redirect URI assembly and token-fragment parsing.
//!
//! The authorization server hands back fully formed redirect URIs; this
//! module only appends the client's `state` echo and, for heartbeat
//! renewals, reads the implicit-grant parameters back out of the fragment.

use std::collections::BTreeMap;

use crate::error::{BridgeError, BridgeResult};

/// Grant parameters extracted from an implicit-grant redirect fragment,
/// e.g. `{access_token, expires_in, token_type}`.
pub type TokenPayload = BTreeMap<String, String>;

/// Appends the client-supplied `state` echo to a grant redirect URI.
///
/// Issued URIs always carry at least one grant parameter (a token fragment
/// or a `code` query), so the echo is joined with `&` onto whichever part
/// the grant landed in. Absent state appends nothing.
#[must_use]
pub fn append_state(redirect_uri: String, state: Option<&str>) -> String {
    match state {
        Some(state) => format!("{redirect_uri}&state={}", urlencoding::encode(state)),
        None => redirect_uri,
    }
}

/// Extracts the grant parameters from an implicit-grant redirect URI, e.g.
/// `https://app.example.com/cb#access_token=4793ihf&expires_in=3600&token_type=bearer`.
///
/// Fails when the URI has no fragment or the fragment carries no usable
/// `access_token`; each case keeps its own message so a broken authorization
/// server answer is diagnosable from the response alone.
pub fn parse_token_fragment(redirect_uri: &str) -> BridgeResult<TokenPayload> {
    let Some((_, fragment)) = redirect_uri.split_once('#') else {
        return Err(BridgeError::RedirectParse(
            "The redirectUri did not contain a hash (\"#\").".to_string(),
        ));
    };

    let payload: TokenPayload = url::form_urlencoded::parse(fragment.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    match payload.get("access_token") {
        Some(token) if !token.is_empty() => Ok(payload),
        _ => Err(BridgeError::RedirectParse(
            "The access_token fragment in the redirectUri could not be located.".to_string(),
        )),
    }
}
