//! Analysis result storage.

pub mod memory;

use crate::analysis::types::AnalysisResult;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Analysis not found: {0}")]
    NotFound(String),
    #[error("Analysis identifier already present: {0}")]
    DuplicateKey(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Keyed store of analysis results.
///
/// Implementations must be safe for concurrent point reads and writes and
/// must never hold a lock across an await point.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert a new result. Fails if `id` is already present.
    async fn put(&self, id: &str, result: AnalysisResult) -> Result<()>;

    async fn get(&self, id: &str) -> Result<AnalysisResult>;

    /// Results ordered newest first, then sliced by `offset` and `limit`.
    /// An offset past the end yields an empty list.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<AnalysisResult>>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
