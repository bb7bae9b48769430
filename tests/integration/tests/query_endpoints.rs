//! Session query endpoints: profile, heartbeat, CORS gating, metadata.

use reqwest::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN,
};
use serde_json::Value;

use crate::common::TestEnv;

#[tokio::test]
async fn profile_without_a_session_is_a_soft_miss() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.profile_url()).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "No session available. Cannot retrieve profile.");

    Ok(())
}

#[tokio::test]
async fn heartbeat_without_a_session_is_denied() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.heartbeat_url()).send().await?;
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "No session available. Cannot renew access token.");

    Ok(())
}

#[tokio::test]
async fn profile_serves_the_mapped_fields_after_login() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.login("weather-api", "abc123").await?;

    let response = env.client.get(env.profile_url()).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["authenticated_userid"], "jane@example.com");
    assert_eq!(body["full_name"], "Jane Doe");

    Ok(())
}

#[tokio::test]
async fn heartbeat_renews_the_token_within_the_window() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.login("weather-api", "abc123").await?;

    let response = env.client.get(env.heartbeat_url()).send().await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["access_token"], "tok-abc123");
    assert_eq!(body["expires_in"], "3600");
    assert_eq!(body["token_type"], "bearer");

    Ok(())
}

#[tokio::test]
async fn cors_grants_credentialed_access_to_recorded_origins_only() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.login("weather-api", "abc123").await?;

    // The issuance redirect pointed at https://app.test/cb, so that origin
    // is now trusted.
    let response = env
        .client
        .get(env.profile_url())
        .header(ORIGIN, "https://app.test")
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://app.test")
    );
    assert_eq!(
        response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );

    // An origin no grant was ever issued to gets no CORS access.
    let response = env
        .client
        .get(env.profile_url())
        .header(ORIGIN, "https://evil.test")
        .send()
        .await?;
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    Ok(())
}

#[tokio::test]
async fn metadata_is_served_with_the_saml_content_type() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.metadata_url()).send().await?;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/samlmetadata+xml")
    );
    let body = response.text().await?;
    assert!(body.contains("EntityDescriptor"));

    Ok(())
}

#[tokio::test]
async fn health_endpoints_live_outside_the_bridge_path() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(format!("{}/ready", env.base_url))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = env
        .client
        .get(format!("{}/health", env.base_url))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "healthy");

    Ok(())
}
