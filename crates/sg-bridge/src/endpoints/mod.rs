//! Bridge endpoint handlers.
//!
//! Axum handlers for the five-endpoint HTTP surface:
//!
//! - **Initiate** — `GET /api/{api_id}`, starts a federated login
//! - **Assert** — `POST /assert`, consumes the identity provider's post-back
//! - **Profile / Heartbeat** — CORS-gated session reads
//! - **Metadata** — service-provider metadata document
//!
//! # Example
//!
//! ```rust,ignore
//! use sg_bridge::endpoints::{bridge_router, BridgeState};
//! use axum::Router;
//!
//! let app = Router::new().nest("/auth-saml", bridge_router(state));
//! ```

mod assert;
mod cookie;
mod heartbeat;
mod initiate;
mod metadata;
mod profile;
mod router;
mod state;

pub use assert::*;
pub use cookie::*;
pub use heartbeat::*;
pub use initiate::*;
pub use metadata::*;
pub use profile::*;
pub use router::*;
pub use state::*;
