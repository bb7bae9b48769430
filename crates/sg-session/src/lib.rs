//! # sg-session
//!
//! Session state for the samlgate identity bridge.
//!
//! This crate defines the per-browser session record that carries a login
//! from initiation through assertion to token issuance, the [`SessionStore`]
//! trait that persists it, and two store implementations: an in-memory map
//! for tests and single-node development, and a redb-backed durable store.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod cleanup;
pub mod durable;
pub mod error;
pub mod memory;
pub mod session;
pub mod store;

pub use cleanup::spawn_cleanup_task;
pub use durable::RedbSessionStore;
pub use error::{SessionError, SessionResult};
pub use memory::MemorySessionStore;
pub use session::{AssertionDocument, AuthSession, ResponseType, SessionPhase, UserInfo};
pub use store::SessionStore;
