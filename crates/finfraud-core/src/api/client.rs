//! API client for the FinFraud backend.
//!
//! Every outbound request goes through [`ApiClient::request`], which reads the
//! credential from the token store at call time, decodes the body and
//! normalizes failures. The endpoint methods below coerce the decoded body
//! into typed results.

use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SharedTokenStore;
use crate::models::{
    HealthStatus, LedgerBlock, LoginRequest, LoginResponse, MeResponse, PredictionResult,
    RecommendationSet, SignupRequest, SignupResponse, TransactionInput, TransactionRecord,
    UserRisk,
};

use super::ApiError;

/// Default backend address, matching the development server
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Options for a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: header::HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: header::HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with a JSON-encoded body
    pub fn post_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))?;
        Ok(Self {
            method: Method::POST,
            headers: header::HeaderMap::new(),
            body: Some(encoded),
        })
    }

    pub fn header(mut self, name: header::HeaderName, value: &str) -> Result<Self, ApiError> {
        self.headers.insert(name, header::HeaderValue::from_str(value)?);
        Ok(self)
    }
}

/// API client for the FinFraud backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SharedTokenStore,
}

impl ApiClient {
    /// Create a client with no request timeout
    pub fn new(base_url: impl Into<String>, store: SharedTokenStore) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, store, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        store: SharedTokenStore,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token store this client reads credentials from
    pub fn store(&self) -> &SharedTokenStore {
        &self.store
    }

    /// Headers for one request: caller headers, JSON content type unless the
    /// caller set one, and the bearer credential when one is stored.
    fn request_headers(&self, options: &RequestOptions) -> Result<header::HeaderMap, ApiError> {
        let mut headers = options.headers.clone();
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
        }

        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read credential, sending unauthenticated");
                None
            }
        };
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Decode a response body: JSON if it parses, the raw text otherwise,
    /// `Null` when empty.
    fn decode_body(text: &str) -> Value {
        if text.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }

    /// Send a request to `path` and return the decoded body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.request_headers(&options)?;
        let authenticated = headers.contains_key(header::AUTHORIZATION);

        debug!(method = %options.method, url = %url, authenticated, "Sending request");

        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = Self::decode_body(&text);

        if !status.is_success() {
            let err = ApiError::from_status(status, &body);
            debug!(
                status = status.as_u16(),
                body = %ApiError::truncate_body(&text),
                "Request failed"
            );
            return Err(err);
        }

        Ok(body)
    }

    /// Send a request and coerce the body into `T`.
    async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.request(path, options).await?;
        serde_json::from_value(body).map_err(|e| {
            ApiError::InvalidResponse(format!("Unexpected response from {}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_as(path, RequestOptions::get()).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request_as(path, RequestOptions::post_json(body)?).await
    }

    // ===== Authentication =====

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login", &LoginRequest { email, password }).await
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupResponse, ApiError> {
        self.post("/auth/signup", &SignupRequest { name, email, password })
            .await
    }

    /// Identity behind the stored credential
    pub async fn me(&self) -> Result<MeResponse, ApiError> {
        self.get("/auth/me").await
    }

    // ===== Fraud service =====

    pub async fn predict(&self, txn: &TransactionInput) -> Result<PredictionResult, ApiError> {
        self.post("/api/predict", txn).await
    }

    pub async fn fetch_recommendations(&self, txn_id: i64) -> Result<RecommendationSet, ApiError> {
        self.get(&format!("/api/recommendations/{}", txn_id)).await
    }

    pub async fn fetch_transaction(&self, txn_id: i64) -> Result<TransactionRecord, ApiError> {
        self.get(&format!("/api/transactions/{}", txn_id)).await
    }

    pub async fn fetch_user_risk(&self, external_id: &str) -> Result<UserRisk, ApiError> {
        self.get(&format!("/api/users/{}/risk", external_id)).await
    }

    // ===== Ledger & system =====

    pub async fn fetch_latest_block(&self) -> Result<LedgerBlock, ApiError> {
        self.get("/chain/latest").await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }
}
