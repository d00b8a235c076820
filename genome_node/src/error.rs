use crate::content_store::ContentStoreError;
use crate::inference::InferenceError;
use crate::ledger::LedgerError;
use crate::storage::StoreError;

pub type Result<T> = std::result::Result<T, GenomeError>;

#[derive(Debug, thiserror::Error)]
pub enum GenomeError {
    #[error("Validation failed on {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Analysis quality score ({actual}) below minting threshold ({threshold})")]
    Ineligible { actual: f64, threshold: f64 },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Mint transaction failed: {0}")]
    MintTransaction(#[source] LedgerError),

    #[error("Duplicate analysis identifier: {0}")]
    DuplicateKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenomeError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for GenomeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateKey(id) => Self::DuplicateKey(id),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<InferenceError> for GenomeError {
    fn from(err: InferenceError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<ContentStoreError> for GenomeError {
    fn from(err: ContentStoreError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<LedgerError> for GenomeError {
    fn from(err: LedgerError) -> Self {
        Self::MintTransaction(err)
    }
}

impl From<tokio::task::JoinError> for GenomeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {}", err))
    }
}
