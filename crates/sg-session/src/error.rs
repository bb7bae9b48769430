//! Session error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during session storage operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session not found.
    #[error("session not found: {0}")]
    NotFound(Uuid),

    /// Underlying storage failed.
    #[error("session storage error: {0}")]
    Storage(String),

    /// Stored session bytes could not be encoded or decoded.
    #[error("session serialization error: {0}")]
    Serialization(String),
}

impl SessionError {
    /// Checks if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
