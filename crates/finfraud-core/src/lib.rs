//! Core library for the FinFraud client.
//!
//! - `auth`: durable credential store, session store and route gate
//! - `api`: the HTTP gateway every request goes through
//! - `dashboard`: actions behind the protected view
//! - `models`: typed request and response payloads
//! - `config`: on-disk configuration and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{GateDecision, Route, Session, SessionError, SessionState, SessionStore, SessionView};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardError};
