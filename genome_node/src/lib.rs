//! Genome Node
//!
//! Accepts DNA sequences over HTTP, scores them through a remote foundation
//! model (or the local heuristic scorer when the model is unreachable), keeps
//! the results in an analysis store and mints qualifying analyses as NFTs on
//! an EVM testnet, paying token rewards to the contributor.

pub mod analysis;
pub mod api;
pub mod common;
pub mod config;
pub mod content_store;
pub mod error;
pub mod inference;
pub mod ledger;
pub mod mint;
pub mod storage;

pub use analysis::types::{
    AnalysisResult, AnalysisType, FunctionalPrediction, QualityScore, SequenceRecord,
    VariantImpact,
};
pub use analysis::{scorer::QualityScorer, validator::SequenceValidator, AnalysisService};
pub use common::Fallback;
pub use config::NodeConfig;
pub use error::{GenomeError, Result};
pub use mint::{MintGate, MintOutcome};
pub use storage::{memory::MemoryAnalysisStore, AnalysisStore};
