use super::{AnalysisStore, Result, StoreError};
use crate::analysis::types::AnalysisResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;

struct Entry {
    /// Insertion order, breaks timestamp ties.
    seq: u64,
    result: AnalysisResult,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Process-lifetime in-memory store. No persistence, no eviction.
#[derive(Default)]
pub struct MemoryAnalysisStore {
    inner: RwLock<Inner>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn put(&self, id: &str, result: AnalysisResult) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.entries.contains_key(id) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(id.to_string(), Entry { seq, result });
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<AnalysisResult> {
        let inner = self.inner.read();
        inner
            .entries
            .get(id)
            .map(|e| e.result.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<AnalysisResult>> {
        let inner = self.inner.read();
        let mut entries: Vec<&Entry> = inner.entries.values().collect();
        entries.sort_by_key(|e| Reverse((e.result.timestamp, e.seq)));
        Ok(entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.result.clone())
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().entries.len())
    }
}
