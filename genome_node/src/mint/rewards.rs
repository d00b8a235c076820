//! Token reward payout after a successful mint.
//!
//! Each leg is its own transfer. A failed leg is reported, never rolled back,
//! and never undoes the mint.

use crate::config::MintConfig;
use crate::ledger::Ledger;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Analysis,
    Mint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardLeg {
    pub kind: RewardKind,
    /// Whole tokens, including any quality bonus.
    pub amount: u64,
    pub status: LegStatus,
    pub transaction_hash: Option<String>,
    pub error: Option<String>,
}

impl RewardLeg {
    pub fn succeeded(&self) -> bool {
        self.status == LegStatus::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSummary {
    /// Paid amounts; a failed leg contributes zero.
    pub analysis_reward: u64,
    pub quality_bonus: u64,
    pub mint_reward: u64,
    pub total_tokens_earned: u64,
    pub legs: Vec<RewardLeg>,
}

impl RewardSummary {
    pub fn all_succeeded(&self) -> bool {
        self.legs.iter().all(RewardLeg::succeeded)
    }

    pub fn transaction_hash(&self, kind: RewardKind) -> Option<&str> {
        self.legs
            .iter()
            .find(|leg| leg.kind == kind)
            .and_then(|leg| leg.transaction_hash.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardPolicy {
    pub analysis_reward: u64,
    pub quality_bonus: u64,
    pub mint_reward: u64,
    pub quality_bonus_threshold: f64,
}

impl From<&MintConfig> for RewardPolicy {
    fn from(config: &MintConfig) -> Self {
        Self {
            analysis_reward: config.analysis_reward,
            quality_bonus: config.quality_bonus,
            mint_reward: config.mint_reward,
            quality_bonus_threshold: config.quality_bonus_threshold,
        }
    }
}

impl RewardPolicy {
    /// Bonus carried by the analysis leg; strictly above the threshold.
    pub fn bonus_for(&self, overall_score: f64) -> u64 {
        if overall_score > self.quality_bonus_threshold {
            self.quality_bonus
        } else {
            0
        }
    }

    /// Pay both legs in order, analysis first.
    pub async fn pay(
        &self,
        ledger: &dyn Ledger,
        recipient: &str,
        overall_score: f64,
    ) -> RewardSummary {
        let bonus = self.bonus_for(overall_score);
        let analysis = pay_leg(ledger, recipient, RewardKind::Analysis, self.analysis_reward + bonus).await;
        let mint = pay_leg(ledger, recipient, RewardKind::Mint, self.mint_reward).await;

        let (analysis_reward, quality_bonus) = if analysis.succeeded() {
            (self.analysis_reward, bonus)
        } else {
            (0, 0)
        };
        let mint_reward = if mint.succeeded() { self.mint_reward } else { 0 };

        RewardSummary {
            analysis_reward,
            quality_bonus,
            mint_reward,
            total_tokens_earned: analysis_reward + quality_bonus + mint_reward,
            legs: vec![analysis, mint],
        }
    }
}

async fn pay_leg(ledger: &dyn Ledger, recipient: &str, kind: RewardKind, amount: u64) -> RewardLeg {
    match ledger.transfer_tokens(recipient, amount).await {
        Ok(receipt) => {
            info!(
                "{:?} reward of {} tokens paid to {} in {}",
                kind, amount, recipient, receipt.transaction_hash
            );
            RewardLeg {
                kind,
                amount,
                status: LegStatus::Succeeded,
                transaction_hash: Some(receipt.transaction_hash),
                error: None,
            }
        }
        Err(err) => {
            warn!("{:?} reward of {} tokens to {} failed: {}", kind, amount, recipient, err);
            RewardLeg {
                kind,
                amount,
                status: LegStatus::Failed,
                transaction_hash: None,
                error: Some(err.to_string()),
            }
        }
    }
}
