mod common;

use axum::{http::StatusCode, routing::post, Json, Router};
use common::{app_with, post_json, RecordingLedger};
use genome_node::analysis::types::AnalysisType;
use genome_node::config::{InferenceConfig, ScoringConfig};
use genome_node::inference::RemoteInferenceClient;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/analyze", addr)
}

fn client(endpoint: String, timeout_secs: u64) -> RemoteInferenceClient {
    let config = InferenceConfig {
        endpoint: Some(endpoint),
        timeout_secs,
    };
    RemoteInferenceClient::new(&config, ScoringConfig::default()).unwrap()
}

async fn model_reply(Json(request): Json<Value>) -> Json<Value> {
    assert!(request["sequence"].is_string());
    Json(json!({
        "quality_score": {
            "overall_score": 88.4,
            "confidence": 0.91,
            "variant_impact": "high",
            "functional_prediction": "likely_pathogenic"
        },
        "gene_annotations": {
            "gc_content": 0.5,
            "analysis_method": "evo2_ai_model",
            "requested_type": request["analysis_type"]
        },
        "analysis_metrics": {"model_version": "evo2_7b"},
        "processing_successful": true
    }))
}

#[tokio::test]
async fn test_remote_result_is_used() {
    let endpoint = spawn_stub(Router::new().route("/analyze", post(model_reply))).await;
    let outcome = client(endpoint, 5)
        .analyze("ATCGATCGATCGATCG", Some("TP53"), AnalysisType::VariantAnalysis)
        .await;

    assert!(!outcome.fell_back());
    let report = outcome.into_value();
    assert_eq!(report.quality.overall_score, 88.4);
    assert_eq!(report.annotations["analysis_method"], "remote_model");
    assert_eq!(report.annotations["model_method"], "evo2_ai_model");
    assert_eq!(report.annotations["requested_type"], "variant_analysis");
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
    );
    let endpoint = spawn_stub(router).await;
    let outcome = client(endpoint, 5)
        .analyze("ATCGATCGATCGATCG", None, AnalysisType::QualityScore)
        .await;

    assert!(outcome.fell_back());
    assert_eq!(outcome.reason(), Some("inference endpoint returned status 500"));
    assert_eq!(outcome.value().quality.overall_score, 55.36);
    assert_eq!(outcome.value().annotations["analysis_method"], "local_fallback");
}

#[tokio::test]
async fn test_malformed_body_falls_back() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { Json(json!({"score": "excellent"})) }),
    );
    let endpoint = spawn_stub(router).await;
    let outcome = client(endpoint, 5)
        .analyze("ATCGATCGATCGATCG", None, AnalysisType::General)
        .await;

    assert!(outcome.fell_back());
    assert!(outcome.reason().unwrap().starts_with("malformed inference response"));
}

#[tokio::test]
async fn test_slow_model_times_out_and_falls_back() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let endpoint = spawn_stub(router).await;
    let started = std::time::Instant::now();
    let outcome = client(endpoint, 1)
        .analyze("ATCGATCGATCGATCG", None, AnalysisType::QualityScore)
        .await;

    assert!(outcome.fell_back());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(outcome.value().annotations["analysis_method"], "local_fallback");
}

#[tokio::test]
async fn test_analyze_endpoint_uses_remote_score() {
    let endpoint = spawn_stub(Router::new().route("/analyze", post(model_reply))).await;
    let app = app_with(
        Arc::new(RecordingLedger::default()),
        InferenceConfig {
            endpoint: Some(endpoint),
            timeout_secs: 5,
        },
    );

    let (status, analysis) = post_json(&app, "/analyze", json!({"sequence": "ATCGATCGATCGATCG"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(analysis["quality_score"]["overall_score"], 88.4);
    assert_eq!(analysis["ready_for_minting"], true);
    assert_eq!(analysis["gene_annotations"]["analysis_metrics"]["model_version"], "evo2_7b");
}
