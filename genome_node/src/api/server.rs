use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::analysis::AnalysisService;
use crate::api::handlers::{analysis, health, mint, wallet};
use crate::config::NodeConfig;
use crate::content_store::{ContentStore, HttpContentStore};
use crate::error::{GenomeError, Result};
use crate::inference::RemoteInferenceClient;
use crate::ledger::{EthersLedger, Ledger};
use crate::mint::MintGate;
use crate::storage::memory::MemoryAnalysisStore;
use crate::storage::AnalysisStore;

// Application State
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub mint_gate: Arc<MintGate>,
    pub ledger: Arc<dyn Ledger>,
    pub content_store: Arc<dyn ContentStore>,
}

impl AppState {
    /// Wire the service from explicit components. Tests use this to inject
    /// in-memory ledger and content-store doubles.
    pub fn new(
        config: &NodeConfig,
        store: Arc<dyn AnalysisStore>,
        inference: Arc<RemoteInferenceClient>,
        ledger: Arc<dyn Ledger>,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        let analysis = Arc::new(AnalysisService::new(
            inference,
            store.clone(),
            config.mint.threshold,
        ));
        let mint_gate = Arc::new(MintGate::new(
            store,
            ledger.clone(),
            content_store.clone(),
            config.mint.clone(),
        ));
        Self {
            analysis,
            mint_gate,
            ledger,
            content_store,
        }
    }

    /// Build the production clients described by `config`.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        let inference = RemoteInferenceClient::new(&config.inference, config.scoring.clone())?;
        let content_store = HttpContentStore::new(&config.content_store)?;
        let ledger = EthersLedger::new(&config.ledger)
            .map_err(|e| GenomeError::Internal(format!("ledger client: {}", e)))?;

        info!(
            "Inference: {}; content store: {}; ledger: {} (signing {})",
            if inference.is_remote_configured() { "remote" } else { "local only" },
            if content_store.is_configured() { "configured" } else { "digest only" },
            config.ledger.network_name,
            if ledger.can_sign() { "enabled" } else { "disabled" },
        );

        Ok(Self::new(
            config,
            Arc::new(MemoryAnalysisStore::new()),
            Arc::new(inference),
            Arc::new(ledger),
            Arc::new(content_store),
        ))
    }
}

// API Router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // Analysis endpoints
        .route("/analyze", post(analysis::analyze_sequence))
        .route("/analyze/batch", post(analysis::analyze_batch))
        .route("/analysis/:analysis_id", get(analysis::get_analysis))
        .route("/analyses", get(analysis::list_analyses))
        // Ledger endpoints
        .route("/mint-nft", post(mint::mint_nft))
        .route("/balance/:address", get(wallet::get_balance))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

// Server startup
pub async fn start_api_server(config: &NodeConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!("Genome node API listening on http://{}", listener.local_addr()?);
    info!("  GET  /health              - Health check");
    info!("  POST /analyze             - Analyze a sequence");
    info!("  POST /analyze/batch       - Analyze up to 20 sequences");
    info!("  GET  /analysis/:id        - Fetch an analysis");
    info!("  GET  /analyses            - List analyses");
    info!("  POST /mint-nft            - Mint an analysis NFT");
    info!("  GET  /balance/:address    - Reward token balance");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
