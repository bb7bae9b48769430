//! Login flow integration tests: initiate, assert, and the redirects
//! between them.

use reqwest::header::{LOCATION, SET_COOKIE};
use sg_bridge::ErrorBody;

use crate::common::{location, TestEnv, VALID_ASSERTION};

#[tokio::test]
async fn implicit_flow_issues_a_token_fragment() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    // Leg 1: initiate. The browser is sent to the identity provider and
    // picks up the session cookie on the way.
    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123&response_type=token&state=xyz"))
        .send()
        .await?;
    assert!(response.status().is_redirection(), "got {}", response.status());
    assert!(response.headers().contains_key(SET_COOKIE), "initiate must set the session cookie");
    assert_eq!(location(&response)?, "https://idp.test/login?api=weather-api");

    // Leg 2: the provider posts the assertion back.
    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert!(response.status().is_redirection(), "got {}", response.status());
    assert_eq!(
        location(&response)?,
        "https://app.test/cb#access_token=tok-abc123&expires_in=3600&token_type=bearer&state=xyz"
    );

    Ok(())
}

#[tokio::test]
async fn code_flow_issues_an_authorization_code() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.initiate_url("orders-api", "?client_id=abc123&response_type=code"))
        .send()
        .await?;
    assert!(response.status().is_redirection());

    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert!(response.status().is_redirection());

    let uri = location(&response)?;
    assert_eq!(uri, "https://app.test/cb?code=code-abc123");
    assert!(!uri.contains('#'), "code flow must not carry a fragment");

    Ok(())
}

#[tokio::test]
async fn initiate_rejects_missing_or_invalid_parameters() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?response_type=token"))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "client_request");
    assert_eq!(body.message, "The query parameter client_id is missing.");

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123"))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.message, "The query parameter response_type is missing.");

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123&response_type=password"))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.message, "Invalid response_type; must be \"token\" or \"code\".");

    Ok(())
}

#[tokio::test]
async fn unknown_subscription_never_reaches_the_identity_provider() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=stranger&response_type=token"))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    assert!(!response.headers().contains_key(LOCATION));
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "client_request");
    assert_eq!(body.message, "Client stranger has no subscription to API weather-api.");

    Ok(())
}

#[tokio::test]
async fn assert_without_a_session_is_a_session_state_error() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert_eq!(response.status(), 500);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "session_state");
    assert_eq!(body.message, "Invalid session state: No session data available.");

    Ok(())
}

#[tokio::test]
async fn rejected_assertion_keeps_the_pending_login_alive() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123&response_type=token"))
        .send()
        .await?;
    assert!(response.status().is_redirection());

    // A forged assertion is rejected opaquely.
    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", "forged")])
        .send()
        .await?;
    assert_eq!(response.status(), 500);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "assertion_rejected");
    assert_eq!(body.message, "The SAML assertion could not be validated.");

    // The pending request survives the rejection; a genuine assertion for
    // the same login still completes.
    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert!(response.status().is_redirection(), "got {}", response.status());
    assert!(location(&response)?.contains("access_token=tok-abc123"));

    Ok(())
}

#[tokio::test]
async fn mapping_without_a_userid_fails_issuance() -> anyhow::Result<()> {
    let env = TestEnv::with_mapping(Some(
        [("display".to_string(), "{{name}}".to_string())].into(),
    ))
    .await?;

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123&response_type=token"))
        .send()
        .await?;
    assert!(response.status().is_redirection());

    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert_eq!(response.status(), 500);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "internal");
    assert_eq!(body.message, "The profile mapping did not produce an authenticated_userid.");

    Ok(())
}

#[tokio::test]
async fn unconfigured_mapping_fails_issuance() -> anyhow::Result<()> {
    let env = TestEnv::with_mapping(None).await?;

    let response = env
        .client
        .get(env.initiate_url("weather-api", "?client_id=abc123&response_type=token"))
        .send()
        .await?;
    assert!(response.status().is_redirection());

    // The diagnostic profile has no authenticated_userid, so issuance is
    // refused rather than minting a grant for nobody.
    let response = env
        .client
        .post(env.assert_url())
        .form(&[("SAMLResponse", VALID_ASSERTION)])
        .send()
        .await?;
    assert_eq!(response.status(), 500);
    let body: ErrorBody = response.json().await?;
    assert_eq!(body.error, "internal");

    Ok(())
}
