use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Json,
};
use log::warn;
use serde::Serialize;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_address;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    /// Base units, decimal string
    pub balance: String,
    pub decimals: u32,
    pub token_contract: String,
}

pub async fn get_balance(
    State(state): State<AppState>,
    address: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<BalanceResponse>> {
    let Path(address) = address?;
    validate_address("address", &address)?;

    let balance = state.ledger.token_balance(&address).await.map_err(|e| {
        warn!("Balance query for {} failed: {}", address, e);
        ApiError::with_details(
            500,
            "Balance query failed".to_string(),
            serde_json::json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(Json(BalanceResponse {
        address,
        balance,
        decimals: state.ledger.token_decimals(),
        token_contract: state.ledger.token_contract().to_string(),
    }))
}
