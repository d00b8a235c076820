use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Annotation key recording which scorer produced a result.
pub const ANALYSIS_METHOD_KEY: &str = "analysis_method";
pub const METHOD_REMOTE_MODEL: &str = "remote_model";
pub const METHOD_LOCAL_FALLBACK: &str = "local_fallback";

/// One analysis request as submitted by a contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub sequence: String,
    #[serde(default)]
    pub gene_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contributor_address: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<AnalysisType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantImpact {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalPrediction {
    LikelyBenign,
    UncertainSignificance,
    LikelyPathogenic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// 0-100
    pub overall_score: f64,
    /// 0-1
    pub confidence: f64,
    pub variant_impact: VariantImpact,
    pub functional_prediction: FunctionalPrediction,
}

/// What the remote model is asked to do with a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    QualityScore,
    VariantAnalysis,
    General,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::QualityScore => "quality_score",
            AnalysisType::VariantAnalysis => "variant_analysis",
            AnalysisType::General => "general",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored outcome of one analysis. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    /// SHA-256 of the normalized sequence.
    pub sequence_hash: String,
    pub quality_score: QualityScore,
    pub gene_annotations: Map<String, Value>,
    pub analysis_metadata: Map<String, Value>,
    /// Seconds.
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
    pub ready_for_minting: bool,
}

impl AnalysisResult {
    pub fn gene_name(&self) -> Option<&str> {
        self.analysis_metadata.get("gene_name").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.analysis_metadata
            .get("description")
            .and_then(Value::as_str)
    }

    pub fn sequence_length(&self) -> u64 {
        self.analysis_metadata
            .get("sequence_length")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn analysis_method(&self) -> Option<&str> {
        self.gene_annotations
            .get(ANALYSIS_METHOD_KEY)
            .and_then(Value::as_str)
    }
}
