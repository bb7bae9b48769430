//! Wire tests for the reqwest upstream adapters, against an in-process
//! stand-in for the SAML provider service and the authorization server.

use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sg_bridge::{AssertionPayload, AuthorizationServer, BridgeError, SamlProvider};
use sg_server::{RemoteAuthorizationServer, RemoteSamlProvider};
use sg_session::UserInfo;
use tokio::net::TcpListener;

/// Spawns an HTTP server speaking both upstream contracts and returns its
/// base URL.
async fn spawn_upstream() -> anyhow::Result<String> {
    let app = Router::new()
        .route(
            "/login",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "login_url": format!(
                        "https://idp.test/login?api={}",
                        body["api_id"].as_str().unwrap_or_default()
                    ),
                    "request_id": "req-9"
                }))
            }),
        )
        .route(
            "/assert",
            post(|Json(body): Json<Value>| async move {
                if body["saml_response"] == "valid-assertion" {
                    Json(json!({
                        "claims": {"sub": "user-1"},
                        "assertion": {"attributes": {"email": "jane@example.com"}}
                    }))
                    .into_response()
                } else {
                    (StatusCode::FORBIDDEN, "assertion refused").into_response()
                }
            }),
        )
        .route("/metadata", get(|| async { "<EntityDescriptor/>" }))
        .route(
            "/apis/{api_id}/subscriptions/{client_id}",
            get(|Path((api_id, client_id)): Path<(String, String)>| async move {
                if client_id == "stranger" {
                    StatusCode::NOT_FOUND.into_response()
                } else {
                    Json(json!({"client_id": client_id, "api_id": api_id})).into_response()
                }
            }),
        )
        .route(
            "/grants/implicit",
            post(|Json(user): Json<Value>| async move {
                Json(json!({
                    "redirect_uri": format!(
                        "https://app.test/cb#access_token=tok-{}&expires_in=3600&token_type=bearer",
                        user["client_id"].as_str().unwrap_or_default()
                    )
                }))
            }),
        )
        .route(
            "/grants/code",
            post(|Json(_user): Json<Value>| async move { Json(json!({"redirect_uri": null})) }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(base_url)
}

fn sample_user() -> UserInfo {
    UserInfo {
        authenticated_userid: "jane%40example.com".to_string(),
        api_id: "weather-api".to_string(),
        client_id: "abc123".to_string(),
        auth_server: "auth-saml".to_string(),
        claims: serde_json::Map::new(),
    }
}

#[tokio::test]
async fn remote_saml_provider_speaks_the_provider_contract() -> anyhow::Result<()> {
    let base = spawn_upstream().await?;
    let provider = RemoteSamlProvider::new(&base, Duration::from_secs(5))?;

    let handle = provider.login("weather-api", "abc123").await?;
    assert_eq!(handle.login_url, "https://idp.test/login?api=weather-api");
    assert_eq!(handle.request_id, "req-9");

    let payload = AssertionPayload {
        saml_response: "valid-assertion".to_string(),
        relay_state: None,
    };
    let identity = provider.assert(&payload, "req-9").await?;
    assert_eq!(identity.claims["sub"], "user-1");
    assert_eq!(identity.assertion["attributes"]["email"], "jane@example.com");

    let forged = AssertionPayload {
        saml_response: "forged".to_string(),
        relay_state: None,
    };
    let err = provider.assert(&forged, "req-9").await.unwrap_err();
    assert!(matches!(err, BridgeError::AssertionRejected(_)), "got {err:?}");

    let document = provider.metadata().await?;
    assert!(document.contains("EntityDescriptor"));

    Ok(())
}

#[tokio::test]
async fn remote_authorization_server_speaks_the_registry_contract() -> anyhow::Result<()> {
    let base = spawn_upstream().await?;
    let authz = RemoteAuthorizationServer::new(&base, Duration::from_secs(5))?;

    let subscription = authz.lookup_subscription("abc123", "weather-api").await?;
    assert_eq!(subscription.client_id, "abc123");
    assert_eq!(subscription.api_id, "weather-api");

    // A 404 from the registry is the client's fault, not the server's.
    let err = authz
        .lookup_subscription("stranger", "weather-api")
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ClientRequest(_)), "got {err:?}");
    assert_eq!(err.to_string(), "Client stranger has no subscription to API weather-api.");

    let user = sample_user();
    let uri = authz.issue_implicit_grant(&user).await?;
    assert_eq!(
        uri.as_deref(),
        Some("https://app.test/cb#access_token=tok-abc123&expires_in=3600&token_type=bearer")
    );

    // An upstream answer without a redirect target is passed through as
    // None; the flow layer decides how to fail.
    let none = authz.issue_authorization_code(&user).await?;
    assert!(none.is_none());

    Ok(())
}
