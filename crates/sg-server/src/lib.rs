//! # sg-server
//!
//! HTTP server for the samlgate identity bridge.
//!
//! This crate assembles the bridge into a runnable service:
//! - environment-driven configuration
//! - reqwest adapters for the SAML provider and authorization server
//! - session store selection (in-memory or durable)
//! - the root router with liveness endpoints and graceful shutdown
//!
//! ## Architecture
//!
//! Collaborators are injected into the [`Server`] at construction. The
//! default wiring talks HTTP to the configured upstream services; tests swap
//! in stubs via the `with_*` builders and drive the same server end to end.
//!
//! ## Usage
//!
//! ```ignore
//! use sg_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod router;
pub mod upstream;

pub use config::ServerConfig;
pub use router::create_router;
pub use upstream::{RemoteAuthorizationServer, RemoteSamlProvider};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use sg_bridge::{
    AuthorizationHook, AuthorizationServer, BridgeConfig, BridgeFlow, BridgeState, FlowSettings,
    OriginAllowList, PassthroughHook, ProfileMapper, SamlProvider,
};
use sg_session::{spawn_cleanup_task, MemorySessionStore, RedbSessionStore, SessionStore};
use tokio::net::TcpListener;

/// Cadence of the session purge and origin allow-list sweep.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// The samlgate server.
pub struct Server {
    config: ServerConfig,
    saml: Arc<dyn SamlProvider>,
    authz: Arc<dyn AuthorizationServer>,
    hook: Arc<dyn AuthorizationHook>,
}

impl Server {
    /// Creates a server wired to the configured upstream services.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let timeout = config.upstream_timeout();
        let saml = RemoteSamlProvider::new(&config.saml_base_url, timeout)?;
        let authz = RemoteAuthorizationServer::new(&config.authz_base_url, timeout)?;

        Ok(Self {
            config,
            saml: Arc::new(saml),
            authz: Arc::new(authz),
            hook: Arc::new(PassthroughHook),
        })
    }

    /// Replaces the SAML provider. Used by tests to stub the upstream.
    #[must_use]
    pub fn with_saml(mut self, saml: Arc<dyn SamlProvider>) -> Self {
        self.saml = saml;
        self
    }

    /// Replaces the authorization server.
    #[must_use]
    pub fn with_authz(mut self, authz: Arc<dyn AuthorizationServer>) -> Self {
        self.authz = authz;
        self
    }

    /// Replaces the authorization hook applied after profile mapping.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn AuthorizationHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and runs the server.
    ///
    /// Blocks until a shutdown signal is received.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Runs the server on an already-bound listener.
    ///
    /// Tests bind port 0 themselves and pass the listener in, keeping the
    /// ephemeral address observable.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let state = self.build_state()?;

        let cleanup = spawn_cleanup_task(state.sessions.clone(), MAINTENANCE_INTERVAL);
        let sweeper = OriginAllowList::spawn_sweeper(state.origins.clone(), MAINTENANCE_INTERVAL);

        let app = create_router(&self.config.base_path, state);

        tracing::info!(
            "Server listening on http://{} (bridge at {})",
            listener.local_addr()?,
            self.config.base_path
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        cleanup.abort();
        sweeper.abort();

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Assembles the bridge state from configuration and collaborators.
    fn build_state(&self) -> anyhow::Result<BridgeState> {
        let lifetime = self.config.session_lifetime();

        let sessions: Arc<dyn SessionStore> = match &self.config.session_db {
            Some(path) => {
                let store = RedbSessionStore::open(path, lifetime)?;
                tracing::info!(path = %path.display(), "durable session store opened");
                Arc::new(store)
            }
            None => {
                tracing::info!("using in-memory session store");
                Arc::new(MemorySessionStore::new(lifetime))
            }
        };

        if self.config.profile_mapping.is_none() {
            tracing::warn!(
                "SG_PROFILE_MAPPING is unset; profiles will carry a diagnostic field only"
            );
        }
        let mapper = ProfileMapper::from_mapping(self.config.profile_mapping.as_ref())?;

        let origins = Arc::new(OriginAllowList::new(lifetime));

        let settings = FlowSettings {
            auth_server: self.config.auth_server_id.clone(),
            upstream_timeout: self.config.upstream_timeout(),
            heartbeat_window: self.config.heartbeat_window(),
        };

        let flow = Arc::new(BridgeFlow::new(
            self.saml.clone(),
            self.authz.clone(),
            self.hook.clone(),
            mapper,
            origins.clone(),
            sessions.clone(),
            settings,
        ));

        let bridge_config = BridgeConfig {
            session_lifetime: lifetime,
            cookie_secure: self.config.cookie_secure,
            ..BridgeConfig::default()
        };

        let key = cookie_key(self.config.session_secret.as_deref());

        Ok(BridgeState::new(flow, sessions, origins, bridge_config, key))
    }
}

/// Derives the cookie signing key from the configured secret.
fn cookie_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => match Key::try_from(secret.as_bytes()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "SG_SESSION_SECRET is unusable (needs at least 64 bytes); \
                     generating a random key"
                );
                Key::generate()
            }
        },
        None => {
            tracing::warn!("SG_SESSION_SECRET is unset; sessions will not survive a restart");
            Key::generate()
        }
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
