//! Local heuristic quality scoring.
//!
//! The score is the sum of three weighted components computed from sequence
//! statistics alone:
//!
//! * length: `min(len / L_ref, 1) * W_len`
//! * GC balance: `(1 - 2 * |gc - 0.5|) * W_gc`, peaking at 50% GC
//! * complexity: `min(distinct_symbols / 4, 1) * W_cx`
//!
//! The sum is clamped to `[0, 100]`. Everything here is pure so it doubles as
//! the offline substitute for the remote model.

use super::types::{
    FunctionalPrediction, QualityScore, VariantImpact, ANALYSIS_METHOD_KEY,
    METHOD_LOCAL_FALLBACK,
};
use crate::config::ScoringConfig;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Per-component contributions behind a local score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub sequence_length: usize,
    pub gc_content: f64,
    pub complexity: f64,
    pub length_score: f64,
    pub gc_score: f64,
    pub complexity_score: f64,
    pub notable_gene: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalScore {
    pub quality: QualityScore,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score an already validated, upper-cased sequence.
    pub fn score(&self, sequence: &str, gene_name: Option<&str>) -> LocalScore {
        let cfg = &self.config;
        let length = sequence.len();

        let gc_content = if length == 0 {
            0.0
        } else {
            let gc = sequence.bytes().filter(|b| matches!(b, b'G' | b'C')).count();
            gc as f64 / length as f64
        };
        let distinct = sequence.bytes().collect::<HashSet<u8>>().len();
        let complexity = (distinct as f64 / 4.0).min(1.0);

        let length_score = (length as f64 / cfg.reference_length).min(1.0) * cfg.length_weight;
        let gc_score = (1.0 - 2.0 * (gc_content - 0.5).abs()) * cfg.gc_weight;
        let complexity_score = complexity * cfg.complexity_weight;

        let mut overall = (length_score + gc_score + complexity_score).clamp(0.0, 100.0);
        let mut confidence = (overall / 100.0).min(cfg.confidence_cap).clamp(0.0, 1.0);

        let notable_gene = gene_name.map_or(false, |g| self.is_notable_gene(g));
        if notable_gene {
            overall = (overall + cfg.notable_gene_score_bonus).clamp(0.0, 100.0);
            confidence = (confidence + cfg.notable_gene_confidence_bonus).clamp(0.0, 1.0);
        }

        let overall = round_to(overall, 2);
        let (variant_impact, functional_prediction) = self.classify(overall);

        LocalScore {
            quality: QualityScore {
                overall_score: overall,
                confidence: round_to(confidence, 3),
                variant_impact,
                functional_prediction,
            },
            breakdown: ScoreBreakdown {
                sequence_length: length,
                gc_content: round_to(gc_content, 3),
                complexity: round_to(complexity, 3),
                length_score: round_to(length_score, 2),
                gc_score: round_to(gc_score, 2),
                complexity_score: round_to(complexity_score, 2),
                notable_gene,
            },
        }
    }

    /// Map an overall score onto impact and functional labels.
    pub fn classify(&self, overall: f64) -> (VariantImpact, FunctionalPrediction) {
        if overall > self.config.high_cut {
            (VariantImpact::High, FunctionalPrediction::LikelyPathogenic)
        } else if overall > self.config.moderate_cut {
            (
                VariantImpact::Moderate,
                FunctionalPrediction::UncertainSignificance,
            )
        } else {
            (VariantImpact::Low, FunctionalPrediction::LikelyBenign)
        }
    }

    pub fn is_notable_gene(&self, gene_name: &str) -> bool {
        let gene = gene_name.trim();
        self.config
            .notable_genes
            .iter()
            .any(|g| g.eq_ignore_ascii_case(gene))
    }
}

impl LocalScore {
    /// Annotation map for a locally scored result.
    pub fn annotations(&self, gene_name: Option<&str>) -> Map<String, Value> {
        let b = &self.breakdown;
        let mut map = Map::new();
        map.insert("sequence_length".into(), json!(b.sequence_length));
        map.insert("gc_content".into(), json!(b.gc_content));
        map.insert("complexity".into(), json!(b.complexity));
        map.insert("gene_name".into(), json!(gene_name));
        map.insert(
            "score_breakdown".into(),
            json!({
                "length_score": b.length_score,
                "gc_score": b.gc_score,
                "complexity_score": b.complexity_score,
                "notable_gene_bonus": b.notable_gene,
            }),
        );
        map.insert(ANALYSIS_METHOD_KEY.into(), json!(METHOD_LOCAL_FALLBACK));
        map
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
