//! Shared doubles and helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use genome_node::api::{create_router, AppState};
use genome_node::config::{InferenceConfig, NodeConfig};
use genome_node::content_store::{ContentStore, ContentStoreError};
use genome_node::inference::RemoteInferenceClient;
use genome_node::ledger::{Ledger, LedgerError, MintReceipt, NftMintCall, TransferReceipt};
use genome_node::MemoryAnalysisStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const CONTRIBUTOR: &str = "0x1111111111111111111111111111111111111111";

/// In-memory ledger recording every call.
#[derive(Default)]
pub struct RecordingLedger {
    pub fail_mint: bool,
    pub fail_transfer_amounts: Vec<u64>,
    pub mints: Mutex<Vec<NftMintCall>>,
    pub transfers: Mutex<Vec<(String, u64)>>,
}

#[async_trait]
impl Ledger for RecordingLedger {
    fn nft_contract(&self) -> &str {
        "0x2181B366B730628F97c44C17de19949e5359682C"
    }

    fn token_contract(&self) -> &str {
        "0x0C5f98e281cB3562a2EEDF3EE63D3b623De98b15"
    }

    fn network_name(&self) -> &str {
        "BNB Smart Chain Testnet"
    }

    fn token_decimals(&self) -> u32 {
        18
    }

    fn can_sign(&self) -> bool {
        true
    }

    async fn token_balance(&self, _address: &str) -> Result<String, LedgerError> {
        let paid: u64 = self.transfers.lock().iter().map(|(_, amount)| amount).sum();
        Ok((paid as u128 * 10u128.pow(18)).to_string())
    }

    async fn mint_nft(&self, call: &NftMintCall) -> Result<MintReceipt, LedgerError> {
        if self.fail_mint {
            return Err(LedgerError::Reverted("0xfeed".to_string()));
        }
        let mut mints = self.mints.lock();
        mints.push(call.clone());
        Ok(MintReceipt {
            transaction_hash: format!("0xmint{}", mints.len()),
            token_id: Some(mints.len().to_string()),
            gas_used: Some(187_000),
            block_number: Some(1_000),
        })
    }

    async fn transfer_tokens(&self, to: &str, amount: u64) -> Result<TransferReceipt, LedgerError> {
        if self.fail_transfer_amounts.contains(&amount) {
            return Err(LedgerError::Rpc("replacement transaction underpriced".to_string()));
        }
        let mut transfers = self.transfers.lock();
        transfers.push((to.to_string(), amount));
        Ok(TransferReceipt {
            transaction_hash: format!("0xreward{}", transfers.len()),
            block_number: Some(1_001),
        })
    }
}

/// Content store that is configured but never reachable.
pub struct UnreachableContentStore;

#[async_trait]
impl ContentStore for UnreachableContentStore {
    async fn upload_json(&self, _document: &Value) -> Result<String, ContentStoreError> {
        Err(ContentStoreError::Transport("connection refused".to_string()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

pub fn app_with(ledger: Arc<RecordingLedger>, inference: InferenceConfig) -> Router {
    let config = NodeConfig {
        inference,
        ..NodeConfig::default()
    };
    let client = RemoteInferenceClient::new(&config.inference, config.scoring.clone())
        .expect("inference client");
    let state = AppState::new(
        &config,
        Arc::new(MemoryAnalysisStore::new()),
        Arc::new(client),
        ledger,
        Arc::new(UnreachableContentStore),
    );
    create_router(state)
}

pub fn local_app(ledger: Arc<RecordingLedger>) -> Router {
    app_with(ledger, InferenceConfig::default())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}
