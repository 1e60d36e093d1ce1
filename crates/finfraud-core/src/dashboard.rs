//! Actions available on the protected dashboard view.
//!
//! The dashboard remembers the last transaction it scored. Actions that need
//! that transaction fail with [`DashboardError::NoTransaction`] before any
//! request is made.

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::models::{
    LedgerBlock, PredictionResult, RecommendationSet, TransactionInput, TransactionRecord,
};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Run a transaction first!")]
    NoTransaction,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Transaction detail together with its recommendations
#[derive(Debug, Clone)]
pub struct TransactionOverview {
    pub transaction: TransactionRecord,
    pub recommendations: RecommendationSet,
}

pub struct Dashboard {
    api: ApiClient,
    last_transaction: Option<i64>,
}

impl Dashboard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            last_transaction: None,
        }
    }

    pub fn last_transaction(&self) -> Option<i64> {
        self.last_transaction
    }

    fn require_transaction(&self) -> Result<i64, DashboardError> {
        self.last_transaction.ok_or(DashboardError::NoTransaction)
    }

    /// Score a transaction and remember its id for follow-up actions.
    pub async fn run_fraud_check(
        &mut self,
        txn: &TransactionInput,
    ) -> Result<PredictionResult, DashboardError> {
        let result = self.api.predict(txn).await?;
        info!(
            transaction_id = ?result.transaction_id,
            verdict = %result.verdict,
            fraud_score = result.fraud_score,
            "Fraud check complete"
        );
        if let Some(id) = result.transaction_id {
            self.last_transaction = Some(id);
        }
        Ok(result)
    }

    pub async fn recommendations(&self) -> Result<RecommendationSet, DashboardError> {
        let id = self.require_transaction()?;
        Ok(self.api.fetch_recommendations(id).await?)
    }

    pub async fn transaction(&self) -> Result<TransactionRecord, DashboardError> {
        let id = self.require_transaction()?;
        Ok(self.api.fetch_transaction(id).await?)
    }

    /// Transaction detail and recommendations, fetched concurrently
    pub async fn overview(&self) -> Result<TransactionOverview, DashboardError> {
        let id = self.require_transaction()?;
        debug!(transaction_id = id, "Fetching transaction overview");
        let (transaction, recommendations) = futures::try_join!(
            self.api.fetch_transaction(id),
            self.api.fetch_recommendations(id)
        )?;
        Ok(TransactionOverview {
            transaction,
            recommendations,
        })
    }

    pub async fn latest_block(&self) -> Result<LedgerBlock, DashboardError> {
        Ok(self.api.fetch_latest_block().await?)
    }
}
