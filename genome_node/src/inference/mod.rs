//! Client for the remotely hosted sequence model.
//!
//! Every failure of the remote call (missing endpoint, transport error,
//! timeout, non-2xx status, unparseable or out-of-range body) is absorbed:
//! the sequence is scored by [`QualityScorer`] instead and the result is
//! returned as [`Fallback::FellBack`] with the reason.

use crate::analysis::scorer::QualityScorer;
use crate::analysis::types::{
    AnalysisType, QualityScore, ANALYSIS_METHOD_KEY, METHOD_LOCAL_FALLBACK, METHOD_REMOTE_MODEL,
};
use crate::common::Fallback;
use crate::config::{InferenceConfig, ScoringConfig};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference endpoint not configured")]
    NotConfigured,
    #[error("inference request timed out after {0:?}")]
    Timeout(Duration),
    #[error("inference transport error: {0}")]
    Transport(String),
    #[error("inference endpoint returned status {0}")]
    Status(u16),
    #[error("malformed inference response: {0}")]
    Malformed(String),
}

/// Score and annotations for one sequence, from either scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    pub quality: QualityScore,
    pub annotations: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    sequence: &'a str,
    gene_name: Option<&'a str>,
    analysis_type: AnalysisType,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    quality_score: QualityScore,
    #[serde(default)]
    gene_annotations: Map<String, Value>,
    #[serde(default)]
    analysis_metrics: Option<Value>,
    #[serde(default = "default_successful")]
    processing_successful: bool,
}

fn default_successful() -> bool {
    true
}

pub struct RemoteInferenceClient {
    endpoint: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
    scorer: QualityScorer,
}

impl RemoteInferenceClient {
    pub fn new(config: &InferenceConfig, scoring: ScoringConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone().filter(|e| !e.trim().is_empty()),
            client,
            timeout: config.timeout(),
            scorer: QualityScorer::new(scoring),
        })
    }

    pub fn is_remote_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Score a validated sequence, remotely if possible.
    pub async fn analyze(
        &self,
        sequence: &str,
        gene_name: Option<&str>,
        analysis_type: AnalysisType,
    ) -> Fallback<InferenceReport> {
        match self.call_remote(sequence, gene_name, analysis_type).await {
            Ok(report) => Fallback::Succeeded(report),
            Err(err) => {
                let reason = err.to_string();
                let mut report = self.score_locally(sequence, gene_name);
                report
                    .annotations
                    .insert("fallback_reason".into(), json!(reason));
                Fallback::FellBack(report, reason)
            }
        }
    }

    pub fn score_locally(&self, sequence: &str, gene_name: Option<&str>) -> InferenceReport {
        let local = self.scorer.score(sequence, gene_name);
        InferenceReport {
            annotations: local.annotations(gene_name),
            quality: local.quality,
        }
    }

    async fn call_remote(
        &self,
        sequence: &str,
        gene_name: Option<&str>,
        analysis_type: AnalysisType,
    ) -> Result<InferenceReport, InferenceError> {
        let endpoint = self.endpoint.as_deref().ok_or(InferenceError::NotConfigured)?;
        debug!(
            "Requesting {} for {} bp from {}",
            analysis_type,
            sequence.len(),
            endpoint
        );

        let request = InferenceRequest {
            sequence,
            gene_name,
            analysis_type,
        };
        let call = async {
            let response = self
                .client
                .post(endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| InferenceError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(InferenceError::Status(status.as_u16()));
            }
            response
                .json::<InferenceResponse>()
                .await
                .map_err(|e| InferenceError::Malformed(e.to_string()))
        };

        let body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;

        let report = into_report(body)?;
        info!(
            "Remote model scored {} bp at {}",
            sequence.len(),
            report.quality.overall_score
        );
        Ok(report)
    }
}

fn into_report(body: InferenceResponse) -> Result<InferenceReport, InferenceError> {
    if !body.processing_successful {
        return Err(InferenceError::Malformed(
            "remote reported processing failure".to_string(),
        ));
    }
    let quality = body.quality_score;
    if !quality.overall_score.is_finite() || !(0.0..=100.0).contains(&quality.overall_score) {
        return Err(InferenceError::Malformed(format!(
            "overall_score {} outside [0, 100]",
            quality.overall_score
        )));
    }
    if !quality.confidence.is_finite() || !(0.0..=1.0).contains(&quality.confidence) {
        return Err(InferenceError::Malformed(format!(
            "confidence {} outside [0, 1]",
            quality.confidence
        )));
    }

    let mut annotations = body.gene_annotations;
    if let Some(reported) = annotations.remove(ANALYSIS_METHOD_KEY) {
        if reported != json!(METHOD_LOCAL_FALLBACK) {
            annotations.insert("model_method".into(), reported);
        }
    }
    if let Some(metrics) = body.analysis_metrics {
        annotations.insert("analysis_metrics".into(), metrics);
    }
    annotations.insert(ANALYSIS_METHOD_KEY.into(), json!(METHOD_REMOTE_MODEL));
    Ok(InferenceReport {
        quality,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{FunctionalPrediction, VariantImpact};

    fn local_client() -> RemoteInferenceClient {
        RemoteInferenceClient::new(&InferenceConfig::default(), ScoringConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_falls_back() {
        let client = local_client();
        assert!(!client.is_remote_configured());
        let outcome = client
            .analyze("ATCGATCGATCGATCG", None, AnalysisType::QualityScore)
            .await;
        assert!(outcome.fell_back());
        assert_eq!(outcome.reason(), Some("inference endpoint not configured"));
        let report = outcome.into_value();
        assert_eq!(report.annotations[ANALYSIS_METHOD_KEY], METHOD_LOCAL_FALLBACK);
        assert_eq!(report.quality.overall_score, 55.36);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let config = InferenceConfig {
            endpoint: Some("http://127.0.0.1:1/analyze".to_string()),
            timeout_secs: 2,
        };
        let client = RemoteInferenceClient::new(&config, ScoringConfig::default()).unwrap();
        let outcome = client
            .analyze("ATCGATCGATCG", Some("TP53"), AnalysisType::General)
            .await;
        assert!(outcome.fell_back());
        assert_eq!(
            outcome.value().annotations[ANALYSIS_METHOD_KEY],
            METHOD_LOCAL_FALLBACK
        );
    }

    #[test]
    fn test_response_tagged_as_remote() {
        let body: InferenceResponse = serde_json::from_value(json!({
            "quality_score": {
                "overall_score": 91.5,
                "confidence": 0.93,
                "variant_impact": "high",
                "functional_prediction": "likely_pathogenic"
            },
            "gene_annotations": {"gc_content": 0.51, "analysis_method": "evo2_ai_model"},
            "analysis_metrics": {"model_version": "evo2_7b"},
            "processing_successful": true
        }))
        .unwrap();
        let report = into_report(body).unwrap();
        assert_eq!(report.quality.variant_impact, VariantImpact::High);
        assert_eq!(
            report.quality.functional_prediction,
            FunctionalPrediction::LikelyPathogenic
        );
        assert_eq!(report.annotations[ANALYSIS_METHOD_KEY], METHOD_REMOTE_MODEL);
        assert_eq!(report.annotations["model_method"], "evo2_ai_model");
        assert_eq!(report.annotations["analysis_metrics"]["model_version"], "evo2_7b");
    }

    #[test]
    fn test_out_of_range_response_is_malformed() {
        let body: InferenceResponse = serde_json::from_value(json!({
            "quality_score": {
                "overall_score": 140.0,
                "confidence": 0.5,
                "variant_impact": "high",
                "functional_prediction": "likely_pathogenic"
            }
        }))
        .unwrap();
        assert!(matches!(into_report(body), Err(InferenceError::Malformed(_))));
    }

    #[test]
    fn test_reported_failure_is_malformed() {
        let body: InferenceResponse = serde_json::from_value(json!({
            "quality_score": {
                "overall_score": 50.0,
                "confidence": 0.5,
                "variant_impact": "low",
                "functional_prediction": "likely_benign"
            },
            "processing_successful": false
        }))
        .unwrap();
        assert!(into_report(body).is_err());
    }
}
