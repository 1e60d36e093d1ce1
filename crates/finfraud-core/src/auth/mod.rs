//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the single bearer credential
//! - `SessionStore`: in-memory session state and its transitions
//! - `gate`: the access decision for protected views
//!
//! A credential persisted by an earlier run is revalidated once at startup;
//! a rejected credential is dropped and the session falls back to anonymous.

pub mod gate;
pub mod session;
pub mod store;

pub use gate::{guard, resolve, GateDecision, Route};
pub use session::{Session, SessionError, SessionState, SessionStore, SessionView, SignupOutcome};
pub use store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, SharedTokenStore, StoreError, TokenStore,
    TOKEN_KEY,
};
