//! Data models for the FinFraud service.
//!
//! Request bodies and the typed results each endpoint is coerced into:
//!
//! - `auth`: login, signup and identity payloads plus the in-memory `User`
//! - `fraud`: transactions, predictions, recommendations, ledger blocks

pub mod auth;
pub mod fraud;

pub use auth::{LoginRequest, LoginResponse, MeResponse, SignupRequest, SignupResponse, User};
pub use fraud::{
    HealthStatus, LedgerBlock, PredictionResult, Recommendation, RecommendationSet,
    TransactionInput, TransactionRecord, UserRisk, Verdict, KNOWN_LOCATIONS,
};
