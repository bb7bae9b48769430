//! # sg-bridge
//!
//! Core of the samlgate identity bridge: the session-backed authentication
//! state machine that turns a federated SSO assertion into an OAuth2 grant,
//! plus the HTTP endpoints that drive it.
//!
//! The bridge owns no protocol internals. SAML validation and OAuth2 token
//! minting live behind the [`SamlProvider`] and [`AuthorizationServer`]
//! traits; this crate sequences them, derives the application-facing profile,
//! applies the per-deployment [`AuthorizationHook`], and manages the
//! cross-origin trust needed for the client application to poll its session.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authz;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod flow;
pub mod hook;
pub mod origins;
pub mod profile;
pub mod redirect;
pub mod saml;

pub use authz::{AuthorizationServer, Subscription};
pub use config::BridgeConfig;
pub use endpoints::{bridge_router, BridgeState};
pub use error::{BridgeError, BridgeResult, ErrorBody};
pub use flow::{BridgeFlow, FlowSettings, LoginRequest};
pub use hook::{AuthorizationHook, HookContext, PassthroughHook};
pub use origins::OriginAllowList;
pub use profile::ProfileMapper;
pub use saml::{AssertedIdentity, AssertionPayload, LoginHandle, SamlProvider};
