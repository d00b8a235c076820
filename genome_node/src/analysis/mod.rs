//! Sequence analysis pipeline: validation, scoring (remote with local
//! fallback) and persistence of the result.

pub mod scorer;
pub mod types;
pub mod validator;

use crate::common::{sha256_hex, Fallback};
use crate::error::{GenomeError, Result};
use crate::inference::RemoteInferenceClient;
use crate::ledger::is_valid_address;
use crate::storage::AnalysisStore;
use chrono::Utc;
use log::{info, warn};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use types::{AnalysisResult, AnalysisType, SequenceRecord};
use validator::SequenceValidator;

/// Genes that default to variant analysis when no analysis type is requested.
pub const CANCER_GENES: [&str; 6] = ["BRCA1", "BRCA2", "TP53", "EGFR", "KRAS", "PIK3CA"];

pub const MAX_GENE_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_BATCH_SIZE: usize = 20;

pub struct AnalysisService {
    validator: SequenceValidator,
    inference: Arc<RemoteInferenceClient>,
    store: Arc<dyn AnalysisStore>,
    mint_threshold: f64,
    counter: AtomicU64,
}

impl AnalysisService {
    pub fn new(
        inference: Arc<RemoteInferenceClient>,
        store: Arc<dyn AnalysisStore>,
        mint_threshold: f64,
    ) -> Self {
        Self {
            validator: SequenceValidator::new(),
            inference,
            store,
            mint_threshold,
            counter: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    pub fn inference(&self) -> &Arc<RemoteInferenceClient> {
        &self.inference
    }

    /// Validate every field of a request. Returns the normalized sequence.
    pub fn validate_record(&self, record: &SequenceRecord) -> Result<String> {
        self.validator.validate_length(&record.sequence)?;
        let sequence = self.validator.validate(&record.sequence)?;

        if let Some(gene) = &record.gene_name {
            if gene.chars().count() > MAX_GENE_NAME_LENGTH {
                return Err(GenomeError::validation(
                    "gene_name",
                    format!("Gene name exceeds {} characters", MAX_GENE_NAME_LENGTH),
                ));
            }
        }
        if let Some(description) = &record.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(GenomeError::validation(
                    "description",
                    format!("Description exceeds {} characters", MAX_DESCRIPTION_LENGTH),
                ));
            }
        }
        if let Some(address) = &record.contributor_address {
            if !is_valid_address(address) {
                return Err(GenomeError::validation(
                    "contributor_address",
                    "Address must be 0x followed by 40 hex characters",
                ));
            }
        }
        Ok(sequence)
    }

    /// Run one analysis and store its result.
    pub async fn analyze(&self, record: SequenceRecord) -> Result<AnalysisResult> {
        let started = Instant::now();
        let sequence = self.validate_record(&record)?;
        let gene_name = record.gene_name.as_deref();
        let analysis_type = record
            .analysis_type
            .unwrap_or_else(|| default_analysis_type(gene_name));

        let outcome = self
            .inference
            .analyze(&sequence, gene_name, analysis_type)
            .await;
        if let Fallback::FellBack(_, reason) = &outcome {
            warn!("Scored locally: {}", reason);
        }
        let report = outcome.into_value();

        let mut gene_annotations = report.annotations;
        if analysis_type == AnalysisType::VariantAnalysis
            && !gene_annotations.contains_key("variant_analysis")
        {
            gene_annotations.insert(
                "variant_analysis".into(),
                variant_summary(sequence.len(), report.quality.overall_score),
            );
        }

        let analysis_id = self.next_analysis_id(&sequence, gene_name);
        let mut analysis_metadata = Map::new();
        analysis_metadata.insert("gene_name".into(), json!(record.gene_name));
        analysis_metadata.insert("description".into(), json!(record.description));
        analysis_metadata.insert(
            "contributor_address".into(),
            json!(record.contributor_address),
        );
        analysis_metadata.insert("sequence_length".into(), json!(sequence.len()));
        analysis_metadata.insert("analysis_type".into(), json!(analysis_type));

        let ready_for_minting = report.quality.overall_score >= self.mint_threshold;
        let result = AnalysisResult {
            analysis_id: analysis_id.clone(),
            sequence_hash: sha256_hex(sequence.as_bytes()),
            quality_score: report.quality,
            gene_annotations,
            analysis_metadata,
            processing_time: started.elapsed().as_secs_f64(),
            timestamp: Utc::now(),
            ready_for_minting,
        };

        self.store.put(&analysis_id, result.clone()).await?;
        info!(
            "Analysis {} completed with score {} (ready for minting: {})",
            analysis_id, result.quality_score.overall_score, ready_for_minting
        );
        Ok(result)
    }

    /// Analyze several records concurrently. The batch is rejected as a whole
    /// if any record fails validation.
    pub async fn analyze_batch(&self, records: Vec<SequenceRecord>) -> Result<Vec<AnalysisResult>> {
        if records.is_empty() || records.len() > MAX_BATCH_SIZE {
            return Err(GenomeError::validation(
                "sequences",
                format!("Batch must contain between 1 and {} sequences", MAX_BATCH_SIZE),
            ));
        }
        for (index, record) in records.iter().enumerate() {
            self.validate_record(record).map_err(|err| match err {
                GenomeError::Validation { field, reason } => GenomeError::Validation {
                    field: format!("sequences[{}].{}", index, field),
                    reason,
                },
                other => other,
            })?;
        }
        futures::future::try_join_all(records.into_iter().map(|r| self.analyze(r))).await
    }

    pub async fn get(&self, analysis_id: &str) -> Result<AnalysisResult> {
        Ok(self.store.get(analysis_id).await?)
    }

    pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<AnalysisResult>> {
        Ok(self.store.list(limit, offset).await?)
    }

    fn next_analysis_id(&self, sequence: &str, gene_name: Option<&str>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let content = format!(
            "{}_{}_{}_{}",
            sequence,
            gene_name.unwrap_or("None"),
            Utc::now().to_rfc3339(),
            n
        );
        sha256_hex(content.as_bytes())[..16].to_string()
    }
}

pub fn default_analysis_type(gene_name: Option<&str>) -> AnalysisType {
    match gene_name {
        Some(gene) if CANCER_GENES.iter().any(|g| g.eq_ignore_ascii_case(gene.trim())) => {
            AnalysisType::VariantAnalysis
        }
        _ => AnalysisType::QualityScore,
    }
}

fn variant_summary(length: usize, overall_score: f64) -> Value {
    json!({
        "variant_type": if length < 1000 { "SNV" } else { "structural" },
        "pathogenicity": if overall_score > 80.0 { "likely_pathogenic" } else { "uncertain" },
        "clinical_significance": if overall_score > 85.0 { "pathogenic" } else { "VUS" },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InferenceConfig, ScoringConfig};
    use crate::storage::memory::MemoryAnalysisStore;

    fn service() -> AnalysisService {
        let inference = Arc::new(
            RemoteInferenceClient::new(&InferenceConfig::default(), ScoringConfig::default())
                .unwrap(),
        );
        AnalysisService::new(inference, Arc::new(MemoryAnalysisStore::new()), 60.0)
    }

    fn record(sequence: &str, gene: Option<&str>) -> SequenceRecord {
        SequenceRecord {
            sequence: sequence.to_string(),
            gene_name: gene.map(str::to_string),
            description: None,
            contributor_address: None,
            analysis_type: None,
        }
    }

    #[tokio::test]
    async fn test_analyze_stores_result() {
        let service = service();
        let result = service
            .analyze(record("atcgatcgatcgatcg", None))
            .await
            .unwrap();
        assert!(!result.ready_for_minting);
        assert_eq!(result.sequence_hash, sha256_hex(b"ATCGATCGATCGATCG"));
        assert_eq!(result.sequence_length(), 16);
        assert_eq!(result.analysis_id.len(), 16);
        let stored = service.get(&result.analysis_id).await.unwrap();
        assert_eq!(stored, result);
    }

    #[tokio::test]
    async fn test_identical_requests_get_distinct_ids() {
        let service = service();
        let a = service.analyze(record("ATCGATCGATCG", None)).await.unwrap();
        let b = service.analyze(record("ATCGATCGATCG", None)).await.unwrap();
        assert_ne!(a.analysis_id, b.analysis_id);
        assert_eq!(a.sequence_hash, b.sequence_hash);
    }

    #[tokio::test]
    async fn test_cancer_gene_defaults_to_variant_analysis() {
        let service = service();
        let result = service
            .analyze(record(&"ATCG".repeat(300), Some("kras")))
            .await
            .unwrap();
        assert_eq!(result.analysis_metadata["analysis_type"], "variant_analysis");
        assert_eq!(
            result.gene_annotations["variant_analysis"]["variant_type"],
            "structural"
        );
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_before_scoring() {
        let service = service();
        let mut req = record("ATCGATCGATCG", None);
        req.contributor_address = Some("0x1234".to_string());
        let err = service.analyze(req).await.unwrap_err();
        assert!(matches!(err, GenomeError::Validation { ref field, .. } if field == "contributor_address"));
        assert!(service.list(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_rejects_whole_batch_on_one_bad_item() {
        let service = service();
        let err = service
            .analyze_batch(vec![
                record("ATCGATCGATCG", None),
                record("ATCGZZATCGATCG", None),
            ])
            .await
            .unwrap_err();
        match err {
            GenomeError::Validation { field, .. } => assert_eq!(field, "sequences[1].sequence"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(service.list(10, 0).await.unwrap().is_empty());
    }

    #[test]
    fn test_default_analysis_type() {
        assert_eq!(default_analysis_type(None), AnalysisType::QualityScore);
        assert_eq!(default_analysis_type(Some("MYC")), AnalysisType::QualityScore);
        assert_eq!(
            default_analysis_type(Some("pik3ca")),
            AnalysisType::VariantAnalysis
        );
    }
}
