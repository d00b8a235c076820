use crate::analysis::types::AnalysisResult;
use crate::config::MintConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RarityTier {
    Legendary,
    Epic,
    Rare,
    Common,
    Basic,
}

impl RarityTier {
    pub fn from_score(overall_score: f64) -> Self {
        if overall_score >= 90.0 {
            RarityTier::Legendary
        } else if overall_score >= 80.0 {
            RarityTier::Epic
        } else if overall_score >= 70.0 {
            RarityTier::Rare
        } else if overall_score >= 60.0 {
            RarityTier::Common
        } else {
            RarityTier::Basic
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RarityTier::Legendary => "Legendary",
            RarityTier::Epic => "Epic",
            RarityTier::Rare => "Rare",
            RarityTier::Common => "Common",
            RarityTier::Basic => "Basic",
        };
        f.write_str(name)
    }
}

pub fn token_name(analysis: &AnalysisResult) -> String {
    format!(
        "Genomic Discovery: {}",
        analysis.gene_name().unwrap_or("Unknown Gene")
    )
}

pub fn token_description(analysis: &AnalysisResult) -> String {
    match analysis.description() {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => format!(
            "High-quality genomic analysis (Score: {}/100)",
            analysis.quality_score.overall_score
        ),
    }
}

/// OpenSea-style token metadata. Depends only on the analysis and the
/// contributor, so the same inputs always give the same document.
pub fn build_metadata(
    analysis: &AnalysisResult,
    contributor_address: &str,
    config: &MintConfig,
    network_name: &str,
) -> Value {
    let score = &analysis.quality_score;
    let rarity = RarityTier::from_score(score.overall_score);

    let mut attributes = vec![
        json!({"trait_type": "Quality Score", "value": score.overall_score, "max_value": 100}),
        json!({"trait_type": "Confidence", "value": score.confidence, "max_value": 1}),
        json!({"trait_type": "Variant Impact", "value": score.variant_impact}),
        json!({"trait_type": "Functional Prediction", "value": score.functional_prediction}),
        json!({"trait_type": "Rarity", "value": rarity.to_string()}),
        json!({"trait_type": "Gene Name", "value": analysis.gene_name().unwrap_or("Unknown")}),
        json!({"trait_type": "Analysis ID", "value": analysis.analysis_id}),
        json!({"trait_type": "Contributor", "value": contributor_address}),
        json!({"trait_type": "Sequence Length", "value": analysis.sequence_length()}),
        json!({"trait_type": "Analysis Date", "value": analysis.timestamp.to_rfc3339()}),
    ];
    for (key, value) in &analysis.gene_annotations {
        if key == "gene_name" || key == "sequence_length" {
            continue;
        }
        attributes.push(json!({"trait_type": format!("annotation:{}", key), "value": value}));
    }

    json!({
        "name": token_name(analysis),
        "description": token_description(analysis),
        "image": config.metadata_image,
        "external_url": format!("{}/{}", config.external_url_base.trim_end_matches('/'), analysis.analysis_id),
        "attributes": attributes,
        "analysis_data": {
            "analysis_id": analysis.analysis_id,
            "sequence_hash": analysis.sequence_hash,
            "quality_score": score,
            "gene_annotations": analysis.gene_annotations,
            "analysis_metadata": analysis.analysis_metadata,
            "rarity": rarity,
            "blockchain_network": network_name,
        }
    })
}
