//! Service-provider metadata endpoint.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::BridgeResult;

use super::state::BridgeState;

/// `GET /metadata.xml` — serves the service-provider metadata document
/// rendered by the SAML provider.
pub async fn metadata_xml(State(state): State<BridgeState>) -> BridgeResult<Response> {
    let document = state.flow.metadata().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/samlmetadata+xml")],
        document,
    )
        .into_response())
}
