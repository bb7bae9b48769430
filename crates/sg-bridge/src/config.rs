//! Bridge-level configuration.

use chrono::Duration;

/// Default name of the signed session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "sg_session";

/// Configuration for the bridge HTTP surface and its session cookie.
///
/// Owned by the composition root and threaded through the endpoint state;
/// nothing here is read from ambient globals.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Name of the signed session cookie.
    pub cookie_name: String,
    /// Session lifetime; bounds both the cookie max-age and how long a
    /// stored session stays loadable.
    pub session_lifetime: Duration,
    /// Sets the cookie `Secure` flag. Secure cookies also get
    /// `SameSite=None` so the identity provider's cross-site POST carries
    /// the session; without `Secure` (plain-HTTP dev setups) the cookie
    /// falls back to `Lax`.
    pub cookie_secure: bool,
}

impl BridgeConfig {
    /// Cookie max-age equivalent of the session lifetime.
    #[must_use]
    pub fn cookie_max_age(&self) -> time::Duration {
        time::Duration::seconds(self.session_lifetime.num_seconds())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            session_lifetime: Duration::minutes(60),
            cookie_secure: true,
        }
    }
}
