//! Content-addressed storage for NFT metadata.
//!
//! Uploads go to an IPFS pinning service when one is configured. When the
//! service is missing or fails, the URI is derived from the SHA-256 of the
//! canonical JSON so minting never blocks on the store.

use crate::common::{sha256_hex, Fallback};
use crate::config::ContentStoreConfig;
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const IPFS_SCHEME: &str = "ipfs://";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContentStoreError {
    #[error("content store not configured")]
    NotConfigured,
    #[error("content store upload timed out after {0:?}")]
    Timeout(Duration),
    #[error("content store transport error: {0}")]
    Transport(String),
    #[error("content store returned status {0}")]
    Status(u16),
    #[error("content store response missing content hash: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a JSON document, returning its `ipfs://<hash>` URI.
    async fn upload_json(&self, document: &Value) -> Result<String, ContentStoreError>;

    fn is_configured(&self) -> bool;
}

/// Upload with digest fallback.
pub async fn upload_or_digest(store: &dyn ContentStore, document: &Value) -> Fallback<String> {
    match store.upload_json(document).await {
        Ok(uri) => Fallback::Succeeded(uri),
        Err(err) => {
            let reason = err.to_string();
            warn!("Metadata upload failed ({}); using digest URI", reason);
            Fallback::FellBack(digest_uri(document), reason)
        }
    }
}

/// `ipfs://` + hex SHA-256 of the compact, key-sorted JSON encoding.
pub fn digest_uri(document: &Value) -> String {
    format!("{}{}", IPFS_SCHEME, sha256_hex(canonical_json(document).as_bytes()))
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json(document: &Value) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for key in keys {
                    out.insert(key.clone(), sorted(&map[key.as_str()]));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    sorted(document).to_string()
}

pub fn hash_from_uri(uri: &str) -> &str {
    uri.strip_prefix(IPFS_SCHEME).unwrap_or(uri)
}

/// Pinning-service response. Pinata answers `IpfsHash`; plain IPFS HTTP
/// APIs answer `Hash` or `cid`.
#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(alias = "IpfsHash", alias = "Hash", alias = "cid")]
    hash: String,
}

pub struct HttpContentStore {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpContentStore {
    pub fn new(config: &ContentStoreConfig) -> Result<Self, ContentStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ContentStoreError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone().filter(|e| !e.trim().is_empty()),
            api_key: config.api_key.clone(),
            client,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload_json(&self, document: &Value) -> Result<String, ContentStoreError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ContentStoreError::NotConfigured)?;

        let mut request = self.client.post(endpoint).json(document);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let call = async {
            let response = request
                .send()
                .await
                .map_err(|e| ContentStoreError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ContentStoreError::Status(status.as_u16()));
            }
            response
                .json::<PinResponse>()
                .await
                .map_err(|e| ContentStoreError::Malformed(e.to_string()))
        };
        let pinned = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ContentStoreError::Timeout(self.timeout))??;

        if pinned.hash.trim().is_empty() {
            return Err(ContentStoreError::Malformed("empty hash".to_string()));
        }
        let uri = format!("{}{}", IPFS_SCHEME, pinned.hash);
        info!("Metadata pinned at {}", uri);
        Ok(uri)
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_ignores_key_order() {
        let a = json!({"b": 1, "a": {"y": [1, 2], "x": null}});
        let b = json!({"a": {"x": null, "y": [1, 2]}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
        assert_eq!(digest_uri(&a), digest_uri(&b));
    }

    #[test]
    fn test_digest_uri_shape() {
        let uri = digest_uri(&json!({"name": "Genomic Discovery: BRCA1"}));
        assert!(uri.starts_with(IPFS_SCHEME));
        assert_eq!(hash_from_uri(&uri).len(), 64);
        assert_ne!(uri, digest_uri(&json!({"name": "Genomic Discovery: TP53"})));
    }

    #[tokio::test]
    async fn test_unconfigured_store_falls_back_to_digest() {
        let store = HttpContentStore::new(&ContentStoreConfig::default()).unwrap();
        assert!(!store.is_configured());
        let doc = json!({"k": "v"});
        let outcome = upload_or_digest(&store, &doc).await;
        assert!(outcome.fell_back());
        assert_eq!(outcome.reason(), Some("content store not configured"));
        assert_eq!(outcome.into_value(), digest_uri(&doc));
    }

    #[tokio::test]
    async fn test_unreachable_store_falls_back_to_digest() {
        let config = ContentStoreConfig {
            endpoint: Some("http://127.0.0.1:1/pin".to_string()),
            api_key: None,
            timeout_secs: 2,
        };
        let store = HttpContentStore::new(&config).unwrap();
        let doc = json!({"k": "v"});
        let outcome = upload_or_digest(&store, &doc).await;
        assert!(outcome.fell_back());
        assert_eq!(outcome.value(), &digest_uri(&doc));
    }
}
