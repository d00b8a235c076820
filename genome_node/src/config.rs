//! Node configuration: defaults, an optional YAML file and `GENOME_*`
//! environment overrides, layered with the `config` crate.

use config::{ConfigError, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable read for the signing key when the prefixed one is unset.
pub const LEGACY_PRIVATE_KEY_VAR: &str = "BLOCKCHAIN_PRIVATE_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub scoring: ScoringConfig,
    pub inference: InferenceConfig,
    pub content_store: ContentStoreConfig,
    pub ledger: LedgerConfig,
    pub mint: MintConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

/// Constants of the local heuristic scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Length at which the length component saturates (`L_ref`).
    pub reference_length: f64,
    pub length_weight: f64,
    pub gc_weight: f64,
    pub complexity_weight: f64,
    /// Scores strictly above this are `moderate`.
    pub moderate_cut: f64,
    /// Scores strictly above this are `high`.
    pub high_cut: f64,
    pub confidence_cap: f64,
    pub notable_genes: Vec<String>,
    pub notable_gene_score_bonus: f64,
    pub notable_gene_confidence_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reference_length: 2000.0,
            length_weight: 45.0,
            gc_weight: 25.0,
            complexity_weight: 30.0,
            moderate_cut: 65.0,
            high_cut: 85.0,
            confidence_cap: 0.95,
            notable_genes: ["BRCA1", "BRCA2", "TP53", "EGFR"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
            notable_gene_score_bonus: 5.0,
            notable_gene_confidence_bonus: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Remote model endpoint. Unset means every analysis is scored locally.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    /// Pinning service URL accepting a JSON document and answering with its
    /// content hash. Unset means metadata URIs are always digest-derived.
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 15,
        }
    }
}

impl ContentStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub network_name: String,
    pub nft_contract: String,
    pub token_contract: String,
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    pub gas_limit: u64,
    pub token_decimals: u32,
    pub confirmation_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545".to_string(),
            chain_id: 97,
            network_name: "BNB Smart Chain Testnet".to_string(),
            nft_contract: "0x2181B366B730628F97c44C17de19949e5359682C".to_string(),
            token_contract: "0x0C5f98e281cB3562a2EEDF3EE63D3b623De98b15".to_string(),
            private_key: None,
            gas_limit: 300_000,
            token_decimals: 18,
            confirmation_timeout_secs: 120,
        }
    }
}

impl LedgerConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MintConfig {
    /// Minimum `overall_score` (0-100) for an analysis to be mintable.
    pub threshold: f64,
    /// `overall_score` (0-100) above which the analysis reward carries the quality bonus.
    pub quality_bonus_threshold: f64,
    pub analysis_reward: u64,
    pub quality_bonus: u64,
    pub mint_reward: u64,
    pub metadata_image: String,
    pub external_url_base: String,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            threshold: 60.0,
            quality_bonus_threshold: 80.0,
            analysis_reward: 100,
            quality_bonus: 50,
            mint_reward: 25,
            metadata_image: "ipfs://QmGenomeNFTImage".to_string(),
            external_url_base: "https://genome-node.app/analysis".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load configuration. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("GENOME")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: NodeConfig = builder.build()?.try_deserialize()?;

        if config.ledger.private_key.is_none() {
            config.ledger.private_key = std::env::var(LEGACY_PRIVATE_KEY_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }

        config.validate()?;
        info!(
            "Configuration loaded (inference: {}, content store: {}, signing key: {})",
            config.inference.endpoint.as_deref().unwrap_or("local only"),
            config.content_store.endpoint.as_deref().unwrap_or("digest only"),
            if config.ledger.private_key.is_some() { "present" } else { "absent" },
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scoring = &self.scoring;
        if scoring.reference_length <= 0.0 {
            return Err(ConfigError::Message(
                "scoring.reference_length must be positive".to_string(),
            ));
        }
        if scoring.moderate_cut > scoring.high_cut {
            return Err(ConfigError::Message(format!(
                "scoring.moderate_cut ({}) exceeds scoring.high_cut ({})",
                scoring.moderate_cut, scoring.high_cut
            )));
        }
        if !(0.0..=100.0).contains(&self.mint.threshold) {
            return Err(ConfigError::Message(format!(
                "mint.threshold must lie in [0, 100], got {}",
                self.mint.threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mint.threshold, 60.0);
        assert_eq!(config.ledger.chain_id, 97);
        assert!(config.inference.endpoint.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = NodeConfig::load(Some(Path::new("/nonexistent/genome_node.yaml")))
            .expect("missing file is not an error");
        assert_eq!(config.scoring.reference_length, 2000.0);
    }

    #[test]
    fn test_sample_file_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/genome_node.yaml");
        let config = NodeConfig::load(Some(&path)).unwrap();
        let defaults = NodeConfig::default();
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.scoring.length_weight, defaults.scoring.length_weight);
        assert_eq!(config.scoring.notable_genes, defaults.scoring.notable_genes);
        assert_eq!(config.ledger.nft_contract, defaults.ledger.nft_contract);
        assert_eq!(config.mint.threshold, defaults.mint.threshold);
    }

    #[test]
    fn test_inverted_cuts_rejected() {
        let mut config = NodeConfig::default();
        config.scoring.moderate_cut = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_private_key_not_serialized() {
        let mut config = NodeConfig::default();
        config.ledger.private_key = Some("deadbeef".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("deadbeef"));
    }
}
