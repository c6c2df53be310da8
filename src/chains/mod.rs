//! Chain-Family Adapters
//!
//! One node type per supported blockchain family. Each type validates its
//! own creation input and renders itself as a table row; the registry is
//! generic over them.

pub mod evm;
pub mod solana;
pub mod terra;

pub use evm::{EvmNode, NewEvmNode};
pub use solana::{NewSolanaNode, SolanaNode};
pub use terra::{NewTerraNode, TerraNode};

use crate::domain::ports::ChainFamily;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Maximum accepted node name length
pub const MAX_NODE_NAME_LEN: usize = 255;

// =============================================================================
// Chains
// =============================================================================

/// A configured chain within a family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    pub id: String,
    pub family: ChainFamily,
    pub enabled: bool,
    /// Family-specific chain settings, passed through untouched
    #[serde(default)]
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ChainRecord {
    pub fn new(family: ChainFamily, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family,
            enabled: true,
            config: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

/// Validate a node name, returning it trimmed
pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    if name.len() > MAX_NODE_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("must be at most {} bytes", MAX_NODE_NAME_LEN),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::validation("name", "must not contain control characters"));
    }
    Ok(name.to_string())
}

/// Parse an endpoint URL and require one of `schemes`
pub(crate) fn validate_url(field: &str, raw: &str, schemes: &[&str]) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }

    let url = Url::parse(raw).map_err(|e| Error::validation(field, format!("invalid URL: {}", e)))?;

    if !schemes.contains(&url.scheme()) {
        return Err(Error::validation(
            field,
            format!(
                "unsupported scheme {}, expected one of {}",
                url.scheme(),
                schemes.join(", ")
            ),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::validation(field, "missing host"));
    }

    Ok(url)
}

pub(crate) const HTTP_SCHEMES: &[&str] = &["http", "https"];
pub(crate) const WS_SCHEMES: &[&str] = &["ws", "wss"];

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  node-A ").unwrap(), "node-A");
        assert_matches!(validate_name(""), Err(Error::Validation { .. }));
        assert_matches!(validate_name("   "), Err(Error::Validation { .. }));
        assert_matches!(validate_name("a\nb"), Err(Error::Validation { .. }));
        assert_matches!(
            validate_name(&"x".repeat(MAX_NODE_NAME_LEN + 1)),
            Err(Error::Validation { .. })
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("url", "https://rpc.example.com:443/path", HTTP_SCHEMES).is_ok());
        assert!(validate_url("url", "wss://rpc.example.com", WS_SCHEMES).is_ok());

        let err = validate_url("wsURL", "http://rpc.example.com", WS_SCHEMES).unwrap_err();
        assert_matches!(err, Error::Validation { ref field, .. } if field == "wsURL");

        assert!(validate_url("url", "not a url", HTTP_SCHEMES).is_err());
        assert!(validate_url("url", "", HTTP_SCHEMES).is_err());
    }
}
