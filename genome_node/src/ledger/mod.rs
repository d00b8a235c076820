//! Ledger access: NFT minting, reward transfers and balance queries against
//! the deployed contracts.

pub mod ethereum;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use ethereum::EthersLedger;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("no signing key configured for transactions")]
    SigningKeyMissing,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("transaction {0} dropped before confirmation")]
    Dropped(String),
    #[error("transaction {tx_hash} not confirmed within {after:?}")]
    Timeout { tx_hash: String, after: Duration },
}

/// Parameters of the NFT contract's `mint` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMintCall {
    pub to: String,
    pub token_uri: String,
    pub gene_name: String,
    pub description: String,
    pub ipfs_hash: String,
    pub quality_score: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub transaction_hash: String,
    pub token_id: Option<String>,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    fn nft_contract(&self) -> &str;

    fn token_contract(&self) -> &str;

    fn network_name(&self) -> &str;

    fn token_decimals(&self) -> u32;

    /// Whether transactions can be signed.
    fn can_sign(&self) -> bool;

    /// Token balance in base units, as a decimal string.
    async fn token_balance(&self, address: &str) -> Result<String, LedgerError>;

    /// Submit the mint and wait for its confirmation. Never retried.
    async fn mint_nft(&self, call: &NftMintCall) -> Result<MintReceipt, LedgerError>;

    /// Transfer `amount` whole reward tokens to `to` and wait for confirmation.
    async fn transfer_tokens(&self, to: &str, amount: u64) -> Result<TransferReceipt, LedgerError>;
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}
