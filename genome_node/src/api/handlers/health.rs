use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::server::AppState;

/// Response for the root endpoint
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Per-dependency status
    pub services: Value,
    pub timestamp: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Genome Node Sequence Analysis API".to_string(),
        status: "operational".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Liveness plus a description of which dependencies are live and which
/// run in fallback mode. Never fails.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let inference = if state.analysis.inference().is_remote_configured() {
        "remote"
    } else {
        "local_fallback"
    };
    let content_store = if state.content_store.is_configured() {
        "configured"
    } else {
        "digest_fallback"
    };
    let stored = state.analysis.store().len().await.ok();

    Json(HealthResponse {
        status: "healthy".to_string(),
        services: json!({
            "inference": inference,
            "content_store": content_store,
            "ledger": {
                "network": state.ledger.network_name(),
                "nft_contract": state.ledger.nft_contract(),
                "minting_enabled": state.ledger.can_sign(),
            },
            "storage": {
                "analyses": stored,
            },
        }),
        timestamp: Utc::now().to_rfc3339(),
    })
}
