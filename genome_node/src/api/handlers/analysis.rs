use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use log::debug;
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::types::{AnalysisResult, SequenceRecord};
use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_pagination;
use crate::error::GenomeError;

#[derive(Debug, Deserialize)]
pub struct BatchAnalysisRequest {
    pub sequences: Vec<SequenceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Analyze one sequence. Work runs on its own task so a dropped connection
/// does not abandon a half-finished analysis.
pub async fn analyze_sequence(
    State(state): State<AppState>,
    payload: Result<Json<SequenceRecord>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnalysisResult>)> {
    let Json(record) = payload?;
    let request_id = Uuid::new_v4().to_string();
    debug!("[{}] analyze {} bp", request_id, record.sequence.len());

    let service = state.analysis.clone();
    let result = tokio::spawn(async move { service.analyze(record).await })
        .await
        .map_err(GenomeError::from)
        .and_then(|r| r)
        .map_err(|e| ApiError::from(e).with_request_id(request_id))?;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn analyze_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchAnalysisRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<AnalysisResult>>)> {
    let Json(batch) = payload?;
    let request_id = Uuid::new_v4().to_string();
    debug!("[{}] batch of {} sequences", request_id, batch.sequences.len());

    let service = state.analysis.clone();
    let results = tokio::spawn(async move { service.analyze_batch(batch.sequences).await })
        .await
        .map_err(GenomeError::from)
        .and_then(|r| r)
        .map_err(|e| ApiError::from(e).with_request_id(request_id))?;

    Ok((StatusCode::CREATED, Json(results)))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    analysis_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Path(analysis_id) = analysis_id?;
    let result = state.analysis.get(&analysis_id).await?;
    Ok(Json(result))
}

/// Newest first, `limit` defaults to 10 and `offset` to 0.
pub async fn list_analyses(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<AnalysisResult>>> {
    let Query(params) = params?;
    let (limit, offset) = validate_pagination(params.limit, params.offset)?;
    let results = state.analysis.list(limit, offset).await?;
    Ok(Json(results))
}
