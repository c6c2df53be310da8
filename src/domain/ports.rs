//! Domain Ports - Core trait definitions for the OCR node
//!
//! These traits define the boundaries between the domain logic and external systems.
//! Adapters implement these traits to provide concrete functionality.

use crate::digest::{ConfigDigest, ConfigDigestPrefix, ContractConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

// =============================================================================
// Chain Families
// =============================================================================

/// Blockchain families with a pluggable node adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Terra,
    Solana,
}

impl ChainFamily {
    /// Every supported family, in registration order
    pub const ALL: [ChainFamily; 3] = [ChainFamily::Evm, ChainFamily::Terra, ChainFamily::Solana];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
            ChainFamily::Terra => "terra",
            ChainFamily::Solana => "solana",
        }
    }
}

impl std::fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "evm" | "eth" => Ok(ChainFamily::Evm),
            "terra" => Ok(ChainFamily::Terra),
            "solana" | "sol" => Ok(ChainFamily::Solana),
            other => Err(Error::UnknownChainFamily(other.to_string())),
        }
    }
}

// =============================================================================
// Config Digester Port
// =============================================================================

/// Computes the digest identifying a protocol instance
///
/// Implementations must be pure: the same digester and config always yield
/// the same digest, and `config_digest_prefix` returns the same constant on
/// every call.
pub trait OffchainConfigDigester: Send + Sync {
    /// Compute the digest for the given contract config
    fn config_digest(&self, config: &ContractConfig) -> Result<ConfigDigest>;

    /// Prefix embedded in every digest this digester produces
    fn config_digest_prefix(&self) -> ConfigDigestPrefix;
}

// =============================================================================
// Chain Node Port
// =============================================================================

/// Renders a value as one row of a table
pub trait TableRenderer {
    /// Column headers, in row order
    fn headers() -> Vec<&'static str>;

    /// Cells for this value
    fn row(&self) -> Vec<String>;
}

/// A chain-family-specific RPC node description
///
/// Each family supplies its own node type; the registry is generic over it.
pub trait ChainNode:
    TableRenderer + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Raw creation input accepted by this family
    type Input: DeserializeOwned + Send;

    /// Family this node type belongs to
    const FAMILY: ChainFamily;

    /// Validate raw input and construct the node for `chain_id`
    fn from_input(chain_id: &str, input: Self::Input) -> Result<Self>;

    /// Unique key within the chain scope
    fn name(&self) -> &str;

    /// Chain this node belongs to
    fn chain_id(&self) -> &str;
}

/// A stored node together with its registry-owned state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "N: ChainNode"))]
pub struct NodeRecord<N> {
    /// Monotonic sequence number; listing order
    pub id: u64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub node: N,
}

impl<N: ChainNode> NodeRecord<N> {
    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn chain_id(&self) -> &str {
        self.node.chain_id()
    }
}

impl<N: ChainNode> TableRenderer for NodeRecord<N> {
    fn headers() -> Vec<&'static str> {
        let mut headers = vec!["ID"];
        headers.extend(N::headers());
        headers.push("Enabled");
        headers
    }

    fn row(&self) -> Vec<String> {
        let mut row = vec![self.id.to_string()];
        row.extend(self.node.row());
        row.push(self.enabled.to_string());
        row
    }
}

// =============================================================================
// Node Store Port
// =============================================================================

/// Persistent store for node records of one chain family
///
/// Records are keyed by `(chain_id, name)` and scanned in ascending `id`
/// order. An insert must become visible atomically.
#[async_trait]
pub trait NodeStore<N: ChainNode>: Send + Sync {
    /// Persist a new record
    async fn insert(&self, record: NodeRecord<N>) -> Result<()>;

    /// Look up a record by name within a chain
    async fn get(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>>;

    /// Records of a chain in ascending id order, skipping `offset`
    async fn scan(&self, chain_id: &str, offset: usize, limit: usize) -> Result<Vec<NodeRecord<N>>>;

    /// Number of records in a chain
    async fn count(&self, chain_id: &str) -> Result<usize>;

    /// Chain size and one slice of it, taken from the same state
    ///
    /// Stores that cannot read both at once fall back to two reads.
    async fn scan_page(
        &self,
        chain_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(usize, Vec<NodeRecord<N>>)> {
        let total = self.count(chain_id).await?;
        let items = self.scan(chain_id, offset, limit).await?;
        Ok((total, items))
    }

    /// Set the enabled flag, returning the updated record
    async fn set_enabled(
        &self,
        chain_id: &str,
        name: &str,
        enabled: bool,
    ) -> Result<Option<NodeRecord<N>>>;

    /// Remove a record, returning it if it existed
    async fn delete(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>>;

    /// Highest id ever stored (0 when empty)
    async fn max_id(&self) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_family_parse() {
        assert_eq!("evm".parse::<ChainFamily>().unwrap(), ChainFamily::Evm);
        assert_eq!("Terra".parse::<ChainFamily>().unwrap(), ChainFamily::Terra);
        assert_eq!("sol".parse::<ChainFamily>().unwrap(), ChainFamily::Solana);
        assert!("cosmos".parse::<ChainFamily>().is_err());
    }

    #[test]
    fn test_chain_family_display_roundtrips() {
        for family in ChainFamily::ALL {
            assert_eq!(family.to_string().parse::<ChainFamily>().unwrap(), family);
        }
    }
}
