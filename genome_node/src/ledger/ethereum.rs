//! EVM ledger client using ethers-rs.
//!
//! Talks JSON-RPC over HTTP to the configured chain. Transactions are signed
//! locally with the configured key; without a key the client still answers
//! balance queries but refuses to mint or transfer.

use super::{Ledger, LedgerError, MintReceipt, NftMintCall, TransferReceipt};
use crate::config::LedgerConfig;
use async_trait::async_trait;
use ethers::abi::RawLog;
use ethers::prelude::*;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

mod bindings {
    use ethers::prelude::abigen;

    abigen!(
        GenomeNft,
        r#"[
            function mint(address to, string tokenURI_, string geneName, string description, string ipfsHash, uint256 qualityScore) external returns (uint256)
            event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)
        ]"#
    );

    abigen!(
        GenomeToken,
        r#"[
            function balanceOf(address account) external view returns (uint256)
            function transfer(address to, uint256 amount) external returns (bool)
        ]"#
    );
}

use bindings::{GenomeNft, GenomeToken, TransferFilter};

type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

const TRANSFER_GAS_LIMIT: u64 = 100_000;

pub struct EthersLedger {
    provider: Provider<Http>,
    signer: Option<Arc<SigningClient>>,
    nft_address: Address,
    token_address: Address,
    nft_contract: String,
    token_contract: String,
    network_name: String,
    gas_limit: u64,
    token_decimals: u32,
    timeout: Duration,
}

impl EthersLedger {
    /// Build the client. No network traffic happens here.
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| LedgerError::Rpc(format!("invalid RPC url: {}", e)))?
            .interval(Duration::from_secs(2));

        let nft_address = parse_address(&config.nft_contract)?;
        let token_address = parse_address(&config.token_contract)?;

        let signer = match config.private_key.as_deref() {
            Some(key) => {
                let wallet = key
                    .trim()
                    .parse::<LocalWallet>()
                    .map_err(|e| LedgerError::InvalidKey(e.to_string()))?
                    .with_chain_id(config.chain_id);
                info!("Ledger signer address: {:?}", wallet.address());
                Some(Arc::new(SignerMiddleware::new(provider.clone(), wallet)))
            }
            None => {
                warn!("No ledger signing key configured; minting is disabled");
                None
            }
        };

        Ok(Self {
            provider,
            signer,
            nft_address,
            token_address,
            nft_contract: config.nft_contract.clone(),
            token_contract: config.token_contract.clone(),
            network_name: config.network_name.clone(),
            gas_limit: config.gas_limit,
            token_decimals: config.token_decimals,
            timeout: config.confirmation_timeout(),
        })
    }

    fn signer(&self) -> Result<Arc<SigningClient>, LedgerError> {
        self.signer.clone().ok_or(LedgerError::SigningKeyMissing)
    }

    fn to_base_units(&self, whole_tokens: u64) -> U256 {
        U256::from(whole_tokens) * U256::exp10(self.token_decimals as usize)
    }

    /// Wait for one confirmation and require a successful status.
    async fn confirm(
        &self,
        pending: PendingTransaction<'_, Http>,
        tx_hash: &str,
    ) -> Result<TransactionReceipt, LedgerError> {
        let receipt = tokio::time::timeout(self.timeout, pending.confirmations(1))
            .await
            .map_err(|_| LedgerError::Timeout {
                tx_hash: tx_hash.to_string(),
                after: self.timeout,
            })?
            .map_err(|e| LedgerError::Rpc(e.to_string()))?
            .ok_or_else(|| LedgerError::Dropped(tx_hash.to_string()))?;

        if receipt.status != Some(U64::from(1)) {
            return Err(LedgerError::Reverted(tx_hash.to_string()));
        }
        Ok(receipt)
    }
}

#[async_trait]
impl Ledger for EthersLedger {
    fn nft_contract(&self) -> &str {
        &self.nft_contract
    }

    fn token_contract(&self) -> &str {
        &self.token_contract
    }

    fn network_name(&self) -> &str {
        &self.network_name
    }

    fn token_decimals(&self) -> u32 {
        self.token_decimals
    }

    fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    async fn token_balance(&self, address: &str) -> Result<String, LedgerError> {
        let account = parse_address(address)?;
        let token = GenomeToken::new(self.token_address, Arc::new(self.provider.clone()));
        let call = token.balance_of(account);
        let balance = tokio::time::timeout(self.timeout, call.call())
            .await
            .map_err(|_| LedgerError::Rpc(format!("balanceOf timed out after {:?}", self.timeout)))?
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        Ok(balance.to_string())
    }

    async fn mint_nft(&self, call: &NftMintCall) -> Result<MintReceipt, LedgerError> {
        let client = self.signer()?;
        let to = parse_address(&call.to)?;
        let nft = GenomeNft::new(self.nft_address, client);

        let tx = nft
            .mint(
                to,
                call.token_uri.clone(),
                call.gene_name.clone(),
                call.description.clone(),
                call.ipfs_hash.clone(),
                U256::from(call.quality_score),
            )
            .gas(self.gas_limit);

        let pending = tokio::time::timeout(self.timeout, tx.send())
            .await
            .map_err(|_| LedgerError::Rpc(format!("mint submission timed out after {:?}", self.timeout)))?
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        info!("NFT mint transaction sent: {}", tx_hash);

        let receipt = self.confirm(pending, &tx_hash).await?;
        let token_id = receipt.logs.iter().find_map(|log| {
            let raw = RawLog {
                topics: log.topics.clone(),
                data: log.data.to_vec(),
            };
            <TransferFilter as EthEvent>::decode_log(&raw)
                .ok()
                .map(|event| event.token_id.to_string())
        });
        let gas_used = receipt.gas_used.map(|g| g.as_u64());
        info!(
            "NFT minted in {} (token {:?}, gas used {:?})",
            tx_hash, token_id, gas_used
        );

        Ok(MintReceipt {
            transaction_hash: tx_hash,
            token_id,
            gas_used,
            block_number: receipt.block_number.map(|b| b.as_u64()),
        })
    }

    async fn transfer_tokens(&self, to: &str, amount: u64) -> Result<TransferReceipt, LedgerError> {
        let client = self.signer()?;
        let recipient = parse_address(to)?;
        let token = GenomeToken::new(self.token_address, client);
        let tx = token
            .transfer(recipient, self.to_base_units(amount))
            .gas(TRANSFER_GAS_LIMIT);

        let pending = tokio::time::timeout(self.timeout, tx.send())
            .await
            .map_err(|_| LedgerError::Rpc(format!("transfer submission timed out after {:?}", self.timeout)))?
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        debug!("Reward transfer of {} tokens to {} sent: {}", amount, to, tx_hash);

        let receipt = self.confirm(pending, &tx_hash).await?;
        Ok(TransferReceipt {
            transaction_hash: tx_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
        })
    }
}

fn parse_address(address: &str) -> Result<Address, LedgerError> {
    if !super::is_valid_address(address) {
        return Err(LedgerError::InvalidAddress(address.to_string()));
    }
    address
        .parse::<Address>()
        .map_err(|e| LedgerError::InvalidAddress(format!("{}: {}", address, e)))
}
