//! Fraud scoring, recommendation and ledger payloads.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Locations the scoring models were trained on.
pub const KNOWN_LOCATIONS: [&str; 8] = [
    "Bangalore", "Delhi", "EU", "Mumbai", "Pune", "Russia", "mobile", "other",
];

const DEFAULT_CURRENCY: &str = "INR";

/// Device id reported by this client
pub const CLIENT_DEVICE_ID: &str = "cli-client";

/// A transaction submitted for scoring (`POST /api/predict`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub external_txn_id: Option<String>,
    pub user_external_id: Option<String>,
    pub amount: f64,
    pub currency: Option<String>,
    pub merchant_id: Option<String>,
    pub device_id: Option<String>,
    pub location: Option<String>,
    pub device_risk_score: Option<f64>,
}

impl TransactionInput {
    /// A transaction with a fresh external id and this client's device id.
    pub fn new(amount: f64) -> Self {
        Self {
            external_txn_id: Some(Uuid::new_v4().to_string()),
            user_external_id: None,
            amount,
            currency: Some(DEFAULT_CURRENCY.to_string()),
            merchant_id: None,
            device_id: Some(CLIENT_DEVICE_ID.to_string()),
            location: None,
            device_risk_score: Some(0.1),
        }
    }

    /// Randomized demo transaction for a quick fraud check.
    pub fn sample() -> Self {
        let mut rng = rand::thread_rng();
        let amount = 20_000 + rng.gen_range(0..100_000);
        Self {
            user_external_id: Some("AMZ".to_string()),
            merchant_id: Some("TestMerchant".to_string()),
            location: Some("Pune".to_string()),
            device_risk_score: Some(rng.gen::<f64>()),
            ..Self::new(f64::from(amount))
        }
    }

    pub fn is_known_location(location: &str) -> bool {
        KNOWN_LOCATIONS.contains(&location)
    }
}

/// Consensus verdict. Unrecognized values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Fraud,
    Legit,
    Other(String),
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "fraud" => Verdict::Fraud,
            "legit" => Verdict::Legit,
            _ => Verdict::Other(s),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Fraud => "fraud".to_string(),
            Verdict::Legit => "legit".to_string(),
            Verdict::Other(s) => s,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fraud => write!(f, "FRAUD"),
            Verdict::Legit => write!(f, "LEGIT"),
            Verdict::Other(s) => write!(f, "{}", s.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reason_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `POST /api/predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub transaction_id: Option<i64>,
    pub verdict: Verdict,
    pub fraud_score: f64,
    pub consensus_score: f64,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub block: Option<Value>,
    #[serde(default)]
    pub recs: Vec<Recommendation>,
}

impl PredictionResult {
    /// Highest recommendation confidence, if any recommendations came back
    pub fn top_confidence(&self) -> Option<f64> {
        self.recs.iter().map(|r| r.confidence).reduce(f64::max)
    }
}

/// Result of `GET /api/recommendations/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of `GET /api/transactions/{id}`. Fields the server adds later are
/// preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub external_txn_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub fraud_score: Option<f64>,
    #[serde(default)]
    pub consensus_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Latest audit ledger block. The server answers `{}` when the chain is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerBlock {
    #[serde(default)]
    pub block_index: Option<i64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub merkle_root: Option<String>,
    #[serde(default)]
    pub entries_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl LedgerBlock {
    pub fn is_empty(&self) -> bool {
        self.block_index.is_none() && self.block_hash.is_none()
    }
}

/// Result of `GET /api/users/{external_id}/risk`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRisk {
    pub external_id: String,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub db: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
