//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Path prefix under which the bridge endpoints are mounted.
    pub base_path: String,

    /// Secret used to sign the session cookie.
    ///
    /// When unset, a random key is generated at startup; sessions then do
    /// not survive a restart and cannot be shared across replicas.
    pub session_secret: Option<String>,

    /// Session lifetime in minutes.
    pub session_minutes: i64,

    /// Path to the durable session database. Sessions are held in memory
    /// when unset.
    pub session_db: Option<PathBuf>,

    /// Identifier stamped into issued user info as `auth_server`.
    pub auth_server_id: String,

    /// Profile mapping: output field name to template over SAML attributes.
    pub profile_mapping: Option<HashMap<String, String>>,

    /// Base URL of the SAML provider service.
    pub saml_base_url: String,

    /// Base URL of the authorization server.
    pub authz_base_url: String,

    /// Deadline for each upstream call, in seconds.
    pub upstream_timeout_secs: u64,

    /// Window after authentication during which heartbeat may renew the
    /// access token, in minutes.
    pub heartbeat_window_minutes: i64,

    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("SG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3010);

        let base_path =
            std::env::var("SG_BASE_PATH").unwrap_or_else(|_| "/auth-saml".to_string());

        let session_secret = std::env::var("SG_SESSION_SECRET").ok();

        let session_minutes = std::env::var("SG_SESSION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let session_db = std::env::var("SG_SESSION_DB").ok().map(PathBuf::from);

        let auth_server_id =
            std::env::var("SG_AUTH_SERVER_ID").unwrap_or_else(|_| "auth-saml".to_string());

        let profile_mapping = match std::env::var("SG_PROFILE_MAPPING") {
            Ok(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                anyhow::anyhow!("SG_PROFILE_MAPPING is not a JSON object of strings: {e}")
            })?),
            Err(_) => None,
        };

        let saml_base_url = std::env::var("SG_SAML_BASE_URL").map_err(|_| {
            anyhow::anyhow!("SG_SAML_BASE_URL environment variable is required")
        })?;

        let authz_base_url = std::env::var("SG_AUTHZ_BASE_URL").map_err(|_| {
            anyhow::anyhow!("SG_AUTHZ_BASE_URL environment variable is required")
        })?;

        let upstream_timeout_secs = std::env::var("SG_UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let heartbeat_window_minutes = std::env::var("SG_HEARTBEAT_WINDOW_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(session_minutes);

        let cookie_secure = std::env::var("SG_COOKIE_SECURE")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            base_path,
            session_secret,
            session_minutes,
            session_db,
            auth_server_id,
            profile_mapping,
            saml_base_url,
            authz_base_url,
            upstream_timeout_secs,
            heartbeat_window_minutes,
            cookie_secure,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            base_path: "/auth-saml".to_string(),
            session_secret: None,
            session_minutes: 60,
            session_db: None,
            auth_server_id: "auth-saml".to_string(),
            profile_mapping: None,
            saml_base_url: "http://localhost:3011".to_string(),
            authz_base_url: "http://localhost:3012".to_string(),
            upstream_timeout_secs: 10,
            heartbeat_window_minutes: 60,
            cookie_secure: false,
        }
    }

    /// Returns the session lifetime.
    #[must_use]
    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_minutes)
    }

    /// Returns the heartbeat renewal window.
    #[must_use]
    pub fn heartbeat_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.heartbeat_window_minutes)
    }

    /// Returns the per-call upstream deadline.
    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3010,
            base_path: "/auth-saml".to_string(),
            session_secret: None,
            session_minutes: 60,
            session_db: None,
            auth_server_id: "auth-saml".to_string(),
            profile_mapping: None,
            saml_base_url: "http://localhost:3011".to_string(),
            authz_base_url: "http://localhost:3012".to_string(),
            upstream_timeout_secs: 10,
            heartbeat_window_minutes: 60,
            cookie_secure: true,
        }
    }
}
