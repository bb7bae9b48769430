//! Bridge error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sg_session::SessionError;
use thiserror::Error;

/// Errors surfaced by the bridge.
///
/// Only [`ClientRequest`](Self::ClientRequest) is the caller's fault;
/// everything else is a server-side or upstream failure and maps to a
/// 500-class response.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Missing or invalid request input.
    #[error("{0}")]
    ClientRequest(String),

    /// The session is missing fields an operation requires. Indicates a
    /// server bug or cookie tampering, not something the user can fix.
    #[error("Invalid session state: {0}")]
    SessionState(String),

    /// The SAML provider rejected or could not validate an assertion.
    /// Carries an opaque message; provider detail goes to the log only.
    #[error("{0}")]
    AssertionRejected(String),

    /// The authorization server failed to mint a grant or returned no
    /// redirect target.
    #[error("{0}")]
    Issuance(String),

    /// A re-derived redirect URI could not be parsed for token extraction.
    #[error("Could not parse redirect URI: {0}")]
    RedirectParse(String),

    /// The authorization hook rejected the identity; its message is
    /// propagated verbatim.
    #[error("{0}")]
    Hook(String),

    /// Session storage failed.
    #[error("session storage failure: {0}")]
    Session(#[from] SessionError),

    /// Anything else: collaborator transport faults, timeouts, broken
    /// deployment configuration.
    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    /// Convenience constructor for client-input errors.
    pub fn client(message: impl Into<String>) -> Self {
        Self::ClientRequest(message.into())
    }

    /// Convenience constructor for session-state errors.
    pub fn session_state(message: impl Into<String>) -> Self {
        Self::SessionState(message.into())
    }

    /// Convenience constructor for internal errors.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ClientRequest(_) => "client_request",
            Self::SessionState(_) => "session_state",
            Self::AssertionRejected(_) => "assertion_rejected",
            Self::Issuance(_) => "issuance_failed",
            Self::RedirectParse(_) => "redirect_parse",
            Self::Hook(_) => "authorization_hook",
            Self::Session(_) => "session_storage",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ClientRequest(_) => 400,
            _ => 500,
        }
    }

    /// Checks if this error is caused by the client's request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

/// JSON body emitted for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "bridge request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
