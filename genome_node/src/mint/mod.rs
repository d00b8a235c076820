//! Minting of analysis NFTs.
//!
//! The gate checks eligibility, publishes metadata, mints, then pays the
//! reward legs. Only the mint itself is fatal; metadata upload failures fall
//! back to a digest URI and reward failures are reported per leg.

pub mod metadata;
pub mod rewards;

use crate::analysis::types::AnalysisResult;
use crate::config::MintConfig;
use crate::content_store::{hash_from_uri, upload_or_digest, ContentStore};
use crate::error::{GenomeError, Result};
use crate::ledger::{is_valid_address, Ledger, MintReceipt, NftMintCall};
use crate::storage::AnalysisStore;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use metadata::{build_metadata, RarityTier};
pub use rewards::{LegStatus, RewardKind, RewardLeg, RewardPolicy, RewardSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub analysis_id: String,
    pub contributor_address: String,
    #[serde(default)]
    pub ipfs_metadata_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    Uploaded,
    DigestFallback,
    Provided,
}

#[derive(Debug, Clone, Serialize)]
pub struct MintOutcome {
    pub analysis_id: String,
    pub quality_score: f64,
    pub rarity: RarityTier,
    pub contributor_address: String,
    pub nft_contract: String,
    pub network: String,
    pub metadata: Value,
    pub metadata_uri: String,
    pub ipfs_hash: String,
    pub metadata_source: MetadataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_fallback_reason: Option<String>,
    pub receipt: MintReceipt,
    pub rewards: RewardSummary,
    pub timestamp: DateTime<Utc>,
}

impl MintOutcome {
    /// True when the mint landed but at least one reward leg did not.
    pub fn is_partial(&self) -> bool {
        !self.rewards.all_succeeded()
    }
}

pub struct MintGate {
    store: Arc<dyn AnalysisStore>,
    ledger: Arc<dyn Ledger>,
    content_store: Arc<dyn ContentStore>,
    config: MintConfig,
    policy: RewardPolicy,
}

impl MintGate {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        ledger: Arc<dyn Ledger>,
        content_store: Arc<dyn ContentStore>,
        config: MintConfig,
    ) -> Self {
        let policy = RewardPolicy::from(&config);
        Self {
            store,
            ledger,
            content_store,
            config,
            policy,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Fails with `Ineligible` unless the analysis was flagged ready and
    /// still meets the configured threshold.
    pub fn check_eligible(&self, analysis: &AnalysisResult) -> Result<()> {
        let actual = analysis.quality_score.overall_score;
        if !analysis.ready_for_minting || actual < self.config.threshold {
            return Err(GenomeError::Ineligible {
                actual,
                threshold: self.config.threshold,
            });
        }
        Ok(())
    }

    pub async fn mint(&self, request: MintRequest) -> Result<MintOutcome> {
        if !is_valid_address(&request.contributor_address) {
            return Err(GenomeError::validation(
                "contributor_address",
                "Address must be 0x followed by 40 hex characters",
            ));
        }
        let provided_uri = match request.ipfs_metadata_uri.as_deref().map(str::trim) {
            Some("") => {
                return Err(GenomeError::validation(
                    "ipfs_metadata_uri",
                    "Metadata URI must not be empty",
                ))
            }
            other => other.map(str::to_string),
        };

        let analysis = self.store.get(&request.analysis_id).await?;
        self.check_eligible(&analysis)?;

        let contributor = request.contributor_address;
        let metadata = build_metadata(
            &analysis,
            &contributor,
            &self.config,
            self.ledger.network_name(),
        );

        let (metadata_uri, metadata_source, metadata_fallback_reason) = match provided_uri {
            Some(uri) => (uri, MetadataSource::Provided, None),
            None => {
                let published = upload_or_digest(self.content_store.as_ref(), &metadata).await;
                let reason = published.reason().map(str::to_string);
                let source = if published.fell_back() {
                    MetadataSource::DigestFallback
                } else {
                    MetadataSource::Uploaded
                };
                (published.into_value(), source, reason)
            }
        };
        let ipfs_hash = hash_from_uri(&metadata_uri).to_string();

        let call = NftMintCall {
            to: contributor.clone(),
            token_uri: metadata_uri.clone(),
            gene_name: analysis.gene_name().unwrap_or("Unknown").to_string(),
            description: metadata::token_description(&analysis),
            ipfs_hash: ipfs_hash.clone(),
            quality_score: analysis.quality_score.overall_score.round() as u64,
        };
        let receipt = self.ledger.mint_nft(&call).await.map_err(|err| {
            warn!("Mint for analysis {} failed: {}", analysis.analysis_id, err);
            GenomeError::MintTransaction(err)
        })?;
        info!(
            "Analysis {} minted to {} in {}",
            analysis.analysis_id, contributor, receipt.transaction_hash
        );

        let rewards = self
            .policy
            .pay(
                self.ledger.as_ref(),
                &contributor,
                analysis.quality_score.overall_score,
            )
            .await;
        if !rewards.all_succeeded() {
            warn!(
                "Analysis {} minted with partial rewards ({} tokens paid)",
                analysis.analysis_id, rewards.total_tokens_earned
            );
        }

        Ok(MintOutcome {
            analysis_id: analysis.analysis_id.clone(),
            quality_score: analysis.quality_score.overall_score,
            rarity: RarityTier::from_score(analysis.quality_score.overall_score),
            contributor_address: contributor,
            nft_contract: self.ledger.nft_contract().to_string(),
            network: self.ledger.network_name().to_string(),
            metadata,
            metadata_uri,
            ipfs_hash,
            metadata_source,
            metadata_fallback_reason,
            receipt,
            rewards,
            timestamp: Utc::now(),
        })
    }
}
