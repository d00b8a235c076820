//! API error handling for the genome node

use crate::error::GenomeError;
use crate::ledger::LedgerError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: u64,
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(code: u16, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            timestamp: chrono::Utc::now().timestamp() as u64,
            request_id: None,
        }
    }

    pub fn with_details(code: u16, message: String, details: serde_json::Value) -> Self {
        Self {
            code,
            message,
            details: Some(details),
            timestamp: chrono::Utc::now().timestamp() as u64,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new(500, message.to_string())
    }

    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::with_details(
            400,
            "Validation error".to_string(),
            serde_json::json!({
                "field": field,
                "reason": reason
            }),
        )
    }

    pub fn analysis_not_found(analysis_id: &str) -> Self {
        Self::with_details(
            404,
            "Analysis not found".to_string(),
            serde_json::json!({
                "analysis_id": analysis_id
            }),
        )
    }

    pub fn below_mint_threshold(actual: f64, threshold: f64) -> Self {
        Self::with_details(
            400,
            format!(
                "Analysis quality score ({}) below minting threshold ({})",
                actual, threshold
            ),
            serde_json::json!({
                "quality_score": actual,
                "threshold": threshold
            }),
        )
    }

    pub fn ledger_error(reason: &LedgerError) -> Self {
        let transaction_hash = match reason {
            LedgerError::Reverted(tx) | LedgerError::Dropped(tx) => Some(tx.clone()),
            LedgerError::Timeout { tx_hash, .. } => Some(tx_hash.clone()),
            _ => None,
        };
        Self::with_details(
            500,
            "NFT minting failed".to_string(),
            serde_json::json!({
                "reason": reason.to_string(),
                "transaction_hash": transaction_hash
            }),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<GenomeError> for ApiError {
    fn from(err: GenomeError) -> Self {
        match err {
            GenomeError::Validation { field, reason } => Self::validation_error(&field, &reason),
            GenomeError::NotFound(id) => Self::analysis_not_found(&id),
            GenomeError::Ineligible { actual, threshold } => {
                Self::below_mint_threshold(actual, threshold)
            }
            GenomeError::MintTransaction(reason) => Self::ledger_error(&reason),
            // Fallbacks absorb these; reaching here means an internal fault.
            other @ (GenomeError::UpstreamUnavailable(_)
            | GenomeError::DuplicateKey(_)
            | GenomeError::Internal(_)) => {
                error!("Request failed: {}", other);
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error("body", &rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_error("query", &rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation_error("path", &rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_taxonomy_status_codes() {
        let cases = [
            (GenomeError::validation("sequence", "too short"), 400),
            (GenomeError::NotFound("abc".to_string()), 404),
            (
                GenomeError::Ineligible {
                    actual: 55.36,
                    threshold: 60.0,
                },
                400,
            ),
            (
                GenomeError::MintTransaction(LedgerError::Rpc("nonce too low".to_string())),
                500,
            ),
            (GenomeError::DuplicateKey("abc".to_string()), 500),
            (GenomeError::Internal("boom".to_string()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code, code);
        }
    }

    #[test]
    fn test_ineligible_details_carry_values() {
        let api = ApiError::from(GenomeError::Ineligible {
            actual: 59.99,
            threshold: 60.0,
        });
        let details = api.details.unwrap();
        assert_eq!(details["quality_score"], 59.99);
        assert_eq!(details["threshold"], 60.0);
    }

    #[test]
    fn test_ledger_failure_keeps_reason_and_tx() {
        let api = ApiError::from(GenomeError::MintTransaction(LedgerError::Timeout {
            tx_hash: "0xabc".to_string(),
            after: Duration::from_secs(120),
        }));
        let details = api.details.unwrap();
        assert_eq!(details["transaction_hash"], "0xabc");
        assert!(details["reason"].as_str().unwrap().contains("not confirmed"));
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let api = ApiError::from(GenomeError::DuplicateKey("a1b2".to_string()));
        assert_eq!(api.message, "Internal server error");
        assert!(api.details.is_none());
    }
}
