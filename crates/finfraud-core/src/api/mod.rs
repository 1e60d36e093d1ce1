//! REST API client module for the FinFraud backend.
//!
//! This module provides the `ApiClient`, the single chokepoint for every
//! outbound request: authentication, fraud scoring, recommendations and the
//! audit ledger.
//!
//! The backend uses bearer token authentication; the token is read from the
//! durable token store on every request.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions, DEFAULT_API_BASE};
pub use error::ApiError;
pub use reqwest::StatusCode;
