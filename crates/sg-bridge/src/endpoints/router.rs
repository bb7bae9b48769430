//! Bridge router assembly.

use axum::http::header::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_TYPE, COOKIE, HOST, ORIGIN, REFERER, USER_AGENT,
};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::assert::assert_post;
use super::heartbeat::heartbeat;
use super::initiate::initiate;
use super::metadata::metadata_xml;
use super::profile::get_profile;
use super::state::BridgeState;

/// Builds the bridge router, ready to be nested under the deployment's base
/// path.
///
/// | Method | Path            | Handler        | Description                          |
/// |--------|-----------------|----------------|--------------------------------------|
/// | GET    | `/metadata.xml` | `metadata_xml` | Service-provider metadata            |
/// | GET    | `/api/{api_id}` | `initiate`     | Start a federated login              |
/// | POST   | `/assert`       | `assert_post`  | Consume the identity provider post   |
/// | GET    | `/profile`      | `get_profile`  | Derived profile (CORS-gated)         |
/// | GET    | `/heartbeat`    | `heartbeat`    | Token renewal (CORS-gated)           |
pub fn bridge_router(state: BridgeState) -> Router {
    let gated = Router::new()
        .route("/profile", get(get_profile))
        .route("/heartbeat", get(heartbeat))
        .layer(cors_layer(&state));

    Router::new()
        .route("/metadata.xml", get(metadata_xml))
        .route("/api/{api_id}", get(initiate))
        .route("/assert", post(assert_post))
        .merge(gated)
        .with_state(state)
}

/// CORS for the session query endpoints: mirror the request origin when the
/// allow-list knows it, with credentials and a fixed header set. Unknown
/// origins get no CORS headers at all; the request itself still runs and
/// the browser withholds the response from the page.
fn cors_layer(state: &BridgeState) -> CorsLayer {
    let origins = state.origins.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().is_ok_and(|origin| origins.is_allowed(origin))
        }))
        .allow_credentials(true)
        .allow_methods([Method::GET])
        .allow_headers([
            ACCEPT,
            ACCEPT_ENCODING,
            CONNECTION,
            USER_AGENT,
            CONTENT_TYPE,
            COOKIE,
            HOST,
            ORIGIN,
            REFERER,
        ])
}
