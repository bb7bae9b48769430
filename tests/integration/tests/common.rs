//! Common test utilities and fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde_json::json;
use sg_bridge::{
    AssertedIdentity, AssertionPayload, AuthorizationServer, BridgeError, BridgeResult,
    LoginHandle, SamlProvider, Subscription,
};
use sg_server::{Server, ServerConfig};
use sg_session::UserInfo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// The one assertion document the stub provider accepts.
pub const VALID_ASSERTION: &str = "valid-assertion";

/// SAML provider stub with deterministic outcomes.
///
/// Accepts exactly [`VALID_ASSERTION`] and hands back a fixed identity with
/// `email` and `name` attributes; everything else is rejected.
pub struct StubSaml;

#[async_trait]
impl SamlProvider for StubSaml {
    async fn login(&self, api_id: &str, _client_id: &str) -> BridgeResult<LoginHandle> {
        Ok(LoginHandle {
            login_url: format!("https://idp.test/login?api={api_id}"),
            request_id: format!("req-{api_id}"),
        })
    }

    async fn assert(
        &self,
        payload: &AssertionPayload,
        request_id: &str,
    ) -> BridgeResult<AssertedIdentity> {
        if payload.saml_response != VALID_ASSERTION {
            return Err(BridgeError::AssertionRejected(format!(
                "stub rejected assertion for {request_id}"
            )));
        }

        let mut claims = serde_json::Map::new();
        claims.insert("sub".to_string(), json!("user-1"));

        Ok(AssertedIdentity {
            claims,
            assertion: json!({
                "attributes": {
                    "email": "jane@example.com",
                    "name": "Jane Doe"
                }
            }),
        })
    }

    async fn metadata(&self) -> BridgeResult<String> {
        Ok(r#"<EntityDescriptor entityID="https://samlgate.test/sp"/>"#.to_string())
    }
}

/// Authorization server stub.
///
/// Knows every client except `stranger`, and issues grants whose redirect
/// URIs encode the client id so tests can assert on them.
pub struct StubAuthz;

#[async_trait]
impl AuthorizationServer for StubAuthz {
    async fn lookup_subscription(
        &self,
        client_id: &str,
        api_id: &str,
    ) -> BridgeResult<Subscription> {
        if client_id == "stranger" {
            return Err(BridgeError::client(format!(
                "Client {client_id} has no subscription to API {api_id}."
            )));
        }
        Ok(Subscription {
            client_id: client_id.to_string(),
            api_id: api_id.to_string(),
        })
    }

    async fn issue_implicit_grant(&self, user_info: &UserInfo) -> BridgeResult<Option<String>> {
        Ok(Some(format!(
            "https://app.test/cb#access_token=tok-{}&expires_in=3600&token_type=bearer",
            user_info.client_id
        )))
    }

    async fn issue_authorization_code(
        &self,
        user_info: &UserInfo,
    ) -> BridgeResult<Option<String>> {
        Ok(Some(format!("https://app.test/cb?code=code-{}", user_info.client_id)))
    }
}

/// Profile mapping used by the default environment.
pub fn default_mapping() -> HashMap<String, String> {
    HashMap::from([
        ("authenticated_userid".to_string(), "{{email}}".to_string()),
        ("full_name".to_string(), "{{name}}".to_string()),
    ])
}

/// Test environment running the real server with stub collaborators.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client with a cookie store and redirects disabled, so the
    /// login dance can be observed leg by leg.
    pub client: Client,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestEnv {
    /// Boots a server with the stub collaborators and the default mapping.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_mapping(Some(default_mapping())).await
    }

    /// Boots a server with an explicit profile mapping (or none).
    pub async fn with_mapping(mapping: Option<HashMap<String, String>>) -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sg_server=debug,sg_bridge=debug")
            .try_init();

        let mut config = ServerConfig::for_testing();
        config.profile_mapping = mapping;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let server = Server::new(config)?
            .with_saml(Arc::new(StubSaml))
            .with_authz(Arc::new(StubAuthz));

        // Create shutdown channel
        let (_shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // Start server
        tokio::spawn(async move {
            tokio::select! {
                result = server.serve(listener) => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    tracing::info!("Server shutdown requested");
                }
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;

        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            _shutdown_tx,
        })
    }

    /// Returns the initiate URL for an API, query string included.
    pub fn initiate_url(&self, api_id: &str, query: &str) -> String {
        format!("{}/auth-saml/api/{}{}", self.base_url, api_id, query)
    }

    /// Returns the assertion consumer URL.
    pub fn assert_url(&self) -> String {
        format!("{}/auth-saml/assert", self.base_url)
    }

    /// Returns the profile URL.
    pub fn profile_url(&self) -> String {
        format!("{}/auth-saml/profile", self.base_url)
    }

    /// Returns the heartbeat URL.
    pub fn heartbeat_url(&self) -> String {
        format!("{}/auth-saml/heartbeat", self.base_url)
    }

    /// Returns the metadata URL.
    pub fn metadata_url(&self) -> String {
        format!("{}/auth-saml/metadata.xml", self.base_url)
    }

    /// Runs the full login dance for `client_id` against `api_id` and
    /// returns the final client redirect URI.
    pub async fn login(&self, api_id: &str, client_id: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(self.initiate_url(
                api_id,
                &format!("?client_id={client_id}&response_type=token"),
            ))
            .send()
            .await?;
        anyhow::ensure!(
            response.status().is_redirection(),
            "initiate should redirect, got {}",
            response.status()
        );

        let response = self
            .client
            .post(self.assert_url())
            .form(&[("SAMLResponse", VALID_ASSERTION)])
            .send()
            .await?;
        anyhow::ensure!(
            response.status().is_redirection(),
            "assert should redirect, got {}",
            response.status()
        );

        location(&response)
    }
}

/// Reads the Location header of a redirect response.
pub fn location(response: &reqwest::Response) -> anyhow::Result<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| anyhow::anyhow!("response carries no Location header"))
}

/// Waits for the server to be ready.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{}/health", base_url);
    let max_attempts = 50;

    for attempt in 1..=max_attempts {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server ready after {} attempts", attempt);
                return Ok(());
            }
            _ => sleep(Duration::from_millis(100)).await,
        }
    }

    anyhow::bail!("server did not become ready at {health_url}")
}
