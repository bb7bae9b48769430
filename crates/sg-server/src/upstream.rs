//! Upstream HTTP adapters.
//!
//! reqwest-backed implementations of the bridge's collaborator traits: the
//! SAML provider service and the authorization server are separate processes
//! spoken to over JSON. Both adapters carry a client-level request timeout on
//! top of the per-call deadline the bridge core imposes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sg_bridge::{
    AssertedIdentity, AssertionPayload, AuthorizationServer, BridgeError, BridgeResult,
    LoginHandle, SamlProvider, Subscription,
};
use sg_session::UserInfo;

/// HTTP adapter for a remote SAML provider service.
///
/// Expected endpoints relative to the base URL: `POST /login`,
/// `POST /assert`, `GET /metadata`.
pub struct RemoteSamlProvider {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSamlProvider {
    /// Creates an adapter for the provider service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> BridgeResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct LoginRequestBody<'a> {
    api_id: &'a str,
    client_id: &'a str,
}

#[derive(Serialize)]
struct AssertRequestBody<'a> {
    request_id: &'a str,
    saml_response: &'a str,
    relay_state: Option<&'a str>,
}

#[async_trait]
impl SamlProvider for RemoteSamlProvider {
    async fn login(&self, api_id: &str, client_id: &str) -> BridgeResult<LoginHandle> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequestBody { api_id, client_id })
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn assert(
        &self,
        payload: &AssertionPayload,
        request_id: &str,
    ) -> BridgeResult<AssertedIdentity> {
        let url = format!("{}/assert", self.base_url);
        let body = AssertRequestBody {
            request_id,
            saml_response: &payload.saml_response,
            relay_state: payload.relay_state.as_deref(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        // A 4xx from the provider is a verdict on the assertion itself; the
        // provider's reasoning stays in the log, not the browser response.
        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BridgeError::AssertionRejected(format!(
                "provider rejected the assertion ({status}): {detail}"
            )));
        }
        read_json(response).await
    }

    async fn metadata(&self) -> BridgeResult<String> {
        let url = format!("{}/metadata", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport)?;
        let response = require_success(response).await?;
        response.text().await.map_err(transport)
    }
}

/// HTTP adapter for the authorization server's subscription registry and
/// grant endpoints.
///
/// Expected endpoints relative to the base URL:
/// `GET /apis/{api_id}/subscriptions/{client_id}`, `POST /grants/implicit`,
/// `POST /grants/code`.
pub struct RemoteAuthorizationServer {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteAuthorizationServer {
    /// Creates an adapter for the authorization server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> BridgeResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn issue_grant(
        &self,
        kind: &str,
        user_info: &UserInfo,
    ) -> BridgeResult<Option<String>> {
        let url = format!("{}/grants/{}", self.base_url, kind);
        let response = self
            .client
            .post(&url)
            .json(user_info)
            .send()
            .await
            .map_err(transport)?;
        let grant: GrantResponse = read_json(response).await?;
        Ok(grant.redirect_uri)
    }
}

#[derive(Deserialize)]
struct GrantResponse {
    redirect_uri: Option<String>,
}

#[async_trait]
impl AuthorizationServer for RemoteAuthorizationServer {
    async fn lookup_subscription(
        &self,
        client_id: &str,
        api_id: &str,
    ) -> BridgeResult<Subscription> {
        let url = format!(
            "{}/apis/{}/subscriptions/{}",
            self.base_url, api_id, client_id
        );
        let response = self.client.get(&url).send().await.map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BridgeError::client(format!(
                "Client {client_id} has no subscription to API {api_id}."
            )));
        }
        read_json(response).await
    }

    async fn issue_implicit_grant(&self, user_info: &UserInfo) -> BridgeResult<Option<String>> {
        self.issue_grant("implicit", user_info).await
    }

    async fn issue_authorization_code(
        &self,
        user_info: &UserInfo,
    ) -> BridgeResult<Option<String>> {
        self.issue_grant("code", user_info).await
    }
}

fn build_client(timeout: Duration) -> BridgeResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(transport)
}

/// Reads a success response as JSON.
async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> BridgeResult<T> {
    let response = require_success(response).await?;
    response.json().await.map_err(transport)
}

/// Rejects non-success responses, keeping the upstream's own words.
async fn require_success(response: reqwest::Response) -> BridgeResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BridgeError::internal(format!(
        "upstream answered {status}: {body}"
    )))
}

fn transport(err: reqwest::Error) -> BridgeError {
    BridgeError::internal(err.to_string())
}
