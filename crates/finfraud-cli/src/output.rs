//! Plain-text rendering of results for the terminal.

use anyhow::Result;
use finfraud_core::api::ApiError;
use finfraud_core::models::{LedgerBlock, PredictionResult, RecommendationSet, User, UserRisk};
use finfraud_core::SessionError;
use serde::Serialize;

/// Format a score with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Format an optional score, "N/A" when missing
pub fn format_optional_score(score: Option<f64>) -> String {
    score.map(format_score).unwrap_or_else(|| "N/A".to_string())
}

pub fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn welcome(user: &User) -> String {
    format!("Welcome, {}", user.display_name())
}

pub fn prediction(result: &PredictionResult) -> String {
    let id = result
        .transaction_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    [
        "Fraud Detection Result".to_string(),
        format!("  Transaction ID:  {}", id),
        format!("  Verdict:         {}", result.verdict),
        format!("  Fraud Score:     {}", format_score(result.fraud_score)),
        format!("  Consensus Score: {}", format_score(result.consensus_score)),
        format!("  Confidence:      {}", format_optional_score(result.top_confidence())),
    ]
    .join("\n")
}

pub fn recommendations(set: &RecommendationSet) -> String {
    let mut lines = vec!["Recommendations".to_string()];
    if set.recommendations.is_empty() {
        lines.push("  (none)".to_string());
    }
    for rec in &set.recommendations {
        lines.push(format!(
            "  [{}] {} ({})",
            rec.category.as_deref().unwrap_or("general"),
            rec.text.as_deref().unwrap_or(""),
            format_score(rec.confidence)
        ));
    }
    lines.push(format!("  Confidence: {}", format_optional_score(set.confidence)));
    lines.join("\n")
}

pub fn ledger_block(block: &LedgerBlock) -> String {
    if block.is_empty() {
        return "Latest Chain Block\n  (ledger is empty)".to_string();
    }
    let field = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    [
        "Latest Chain Block".to_string(),
        format!("  Index:       {}", field(block.block_index.map(|i| i.to_string()))),
        format!("  Hash:        {}", field(block.block_hash.clone())),
        format!("  Merkle Root: {}", field(block.merkle_root.clone())),
        format!("  Entries:     {}", field(block.entries_count.map(|n| n.to_string()))),
        format!("  Created:     {}", field(block.created_at.clone())),
    ]
    .join("\n")
}

pub fn user_risk(risk: &UserRisk) -> String {
    format!(
        "Risk for {}: {}",
        risk.external_id,
        format_optional_score(risk.risk_score)
    )
}

/// User-facing message for a failed login or signup
pub fn auth_error_message(err: &SessionError) -> String {
    match err {
        SessionError::Api(ApiError::NetworkError(e)) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        SessionError::Api(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        other => other.to_string(),
    }
}
