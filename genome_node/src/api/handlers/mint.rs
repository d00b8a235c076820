use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_address;
use crate::error::GenomeError;
use crate::mint::{MetadataSource, MintOutcome, MintRequest, RarityTier, RewardKind, RewardLeg};

/// Response for a completed mint
#[derive(Debug, Serialize)]
pub struct MintResponse {
    /// "success", or "partial" when a reward leg failed
    pub status: String,
    pub message: String,
    pub analysis_id: String,
    pub quality_score: f64,
    pub rarity: RarityTier,
    pub contributor_address: String,
    pub rewards: RewardsView,
    pub nft_details: NftDetails,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

#[derive(Debug, Serialize)]
pub struct RewardsView {
    pub analysis_reward: u64,
    pub mint_reward: u64,
    pub quality_bonus: u64,
    pub total_tokens_earned: u64,
    pub reward_transactions: RewardTransactions,
    pub legs: Vec<RewardLeg>,
}

#[derive(Debug, Serialize)]
pub struct RewardTransactions {
    pub analysis_tx: Option<String>,
    pub mint_tx: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NftDetails {
    pub contract_address: String,
    pub token_id: Option<String>,
    pub transaction_hash: String,
    pub ipfs_hash: String,
    pub metadata_url: String,
    pub metadata_source: MetadataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_fallback_reason: Option<String>,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
}

impl From<MintOutcome> for MintResponse {
    fn from(outcome: MintOutcome) -> Self {
        let partial = outcome.is_partial();
        let rewards = outcome.rewards;
        Self {
            status: if partial { "partial" } else { "success" }.to_string(),
            message: if partial {
                "NFT minted; some reward transfers failed".to_string()
            } else {
                "NFT minted successfully".to_string()
            },
            analysis_id: outcome.analysis_id,
            quality_score: outcome.quality_score,
            rarity: outcome.rarity,
            contributor_address: outcome.contributor_address,
            rewards: RewardsView {
                analysis_reward: rewards.analysis_reward,
                mint_reward: rewards.mint_reward,
                quality_bonus: rewards.quality_bonus,
                total_tokens_earned: rewards.total_tokens_earned,
                reward_transactions: RewardTransactions {
                    analysis_tx: rewards.transaction_hash(RewardKind::Analysis).map(str::to_string),
                    mint_tx: rewards.transaction_hash(RewardKind::Mint).map(str::to_string),
                },
                legs: rewards.legs,
            },
            nft_details: NftDetails {
                contract_address: outcome.nft_contract,
                token_id: outcome.receipt.token_id,
                transaction_hash: outcome.receipt.transaction_hash,
                ipfs_hash: outcome.ipfs_hash,
                metadata_url: outcome.metadata_uri,
                metadata_source: outcome.metadata_source,
                metadata_fallback_reason: outcome.metadata_fallback_reason,
                gas_used: outcome.receipt.gas_used,
                block_number: outcome.receipt.block_number,
            },
            timestamp: outcome.timestamp,
            platform: outcome.network,
        }
    }
}

/// Mint the NFT for an eligible analysis and pay its rewards. The mint runs
/// on its own task; once submitted it completes even if the client leaves.
pub async fn mint_nft(
    State(state): State<AppState>,
    payload: Result<Json<MintRequest>, JsonRejection>,
) -> ApiResult<Json<MintResponse>> {
    let Json(request) = payload?;
    validate_address("contributor_address", &request.contributor_address)?;
    let request_id = Uuid::new_v4().to_string();
    debug!("[{}] mint for analysis {}", request_id, request.analysis_id);

    let gate = state.mint_gate.clone();
    let outcome = tokio::spawn(async move { gate.mint(request).await })
        .await
        .map_err(GenomeError::from)
        .and_then(|r| r)
        .map_err(|e| ApiError::from(e).with_request_id(request_id))?;

    Ok(Json(MintResponse::from(outcome)))
}
