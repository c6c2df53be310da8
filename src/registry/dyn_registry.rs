//! Family-Erased Registry Access
//!
//! [`DynNodeRegistry`] erases the node type of a [`NodeRegistry`] so the
//! admin API and metrics can dispatch on a chain family tag. Inputs and
//! records cross this boundary as JSON values. [`NodeRegistries`] is the
//! lookup table built once at startup.

use super::node_registry::{NodeRegistry, RegistryConfig, RegistryStatsSnapshot};
use super::pagination::{Page, PageRequest};
use super::store::{FileNodeStore, MemoryNodeStore};
use crate::chains::{ChainRecord, EvmNode, SolanaNode, TerraNode};
use crate::domain::ports::{ChainFamily, ChainNode, NodeStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Node registry operations with the node type erased
#[async_trait]
pub trait DynNodeRegistry: Send + Sync {
    fn family(&self) -> ChainFamily;

    /// Validate the family-specific JSON input and create a node
    async fn create_node(&self, chain_id: &str, input: Value) -> Result<Value>;

    /// Parse raw paging parameters, then list a chain's nodes
    ///
    /// Malformed parameters are rejected before the store is touched.
    async fn list_nodes(
        &self,
        chain_id: &str,
        page: Option<&str>,
        size: Option<&str>,
    ) -> Result<Page<Value>>;

    async fn get_node(&self, chain_id: &str, name: &str) -> Result<Value>;

    async fn set_enabled(&self, chain_id: &str, name: &str, enabled: bool) -> Result<Value>;

    async fn delete_node(&self, chain_id: &str, name: &str) -> Result<Value>;

    /// Total nodes across every chain of the family
    async fn node_count(&self) -> Result<usize>;

    fn register_chain(&self, chain: ChainRecord) -> Result<()>;

    fn chain(&self, chain_id: &str) -> Result<ChainRecord>;

    fn list_chains(&self, page: Option<&str>, size: Option<&str>) -> Result<Page<ChainRecord>>;

    fn chain_ids(&self) -> Vec<String>;

    fn stats(&self) -> RegistryStatsSnapshot;
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[async_trait]
impl<N: ChainNode> DynNodeRegistry for NodeRegistry<N> {
    fn family(&self) -> ChainFamily {
        N::FAMILY
    }

    async fn create_node(&self, chain_id: &str, input: Value) -> Result<Value> {
        let input: N::Input = serde_json::from_value(input)
            .map_err(|e| Error::validation("body", e.to_string()))?;
        let record = NodeRegistry::create_node(self, chain_id, input).await?;
        to_value(&record)
    }

    async fn list_nodes(
        &self,
        chain_id: &str,
        page: Option<&str>,
        size: Option<&str>,
    ) -> Result<Page<Value>> {
        let request = PageRequest::parse(page, size)?;
        NodeRegistry::list_nodes(self, chain_id, &request)
            .await?
            .try_map(|record| to_value(&record))
    }

    async fn get_node(&self, chain_id: &str, name: &str) -> Result<Value> {
        to_value(&NodeRegistry::get_node(self, chain_id, name).await?)
    }

    async fn set_enabled(&self, chain_id: &str, name: &str, enabled: bool) -> Result<Value> {
        to_value(&NodeRegistry::set_enabled(self, chain_id, name, enabled).await?)
    }

    async fn delete_node(&self, chain_id: &str, name: &str) -> Result<Value> {
        to_value(&NodeRegistry::delete_node(self, chain_id, name).await?)
    }

    async fn node_count(&self) -> Result<usize> {
        let mut total = 0;
        for chain_id in NodeRegistry::chain_ids(self) {
            total += NodeRegistry::node_count(self, &chain_id).await?;
        }
        Ok(total)
    }

    fn register_chain(&self, chain: ChainRecord) -> Result<()> {
        NodeRegistry::register_chain(self, chain)
    }

    fn chain(&self, chain_id: &str) -> Result<ChainRecord> {
        NodeRegistry::chain(self, chain_id)
    }

    fn list_chains(&self, page: Option<&str>, size: Option<&str>) -> Result<Page<ChainRecord>> {
        let request = PageRequest::parse(page, size)?;
        Ok(NodeRegistry::list_chains(self, &request))
    }

    fn chain_ids(&self) -> Vec<String> {
        NodeRegistry::chain_ids(self)
    }

    fn stats(&self) -> RegistryStatsSnapshot {
        NodeRegistry::stats(self)
    }
}

// =============================================================================
// Lookup Table
// =============================================================================

/// Registries of every supported chain family, keyed by family
#[derive(Clone)]
pub struct NodeRegistries {
    evm: Arc<NodeRegistry<EvmNode>>,
    terra: Arc<NodeRegistry<TerraNode>>,
    solana: Arc<NodeRegistry<SolanaNode>>,
    by_family: IndexMap<ChainFamily, Arc<dyn DynNodeRegistry>>,
}

impl NodeRegistries {
    fn from_parts(
        evm: Arc<NodeRegistry<EvmNode>>,
        terra: Arc<NodeRegistry<TerraNode>>,
        solana: Arc<NodeRegistry<SolanaNode>>,
    ) -> Self {
        let mut by_family: IndexMap<ChainFamily, Arc<dyn DynNodeRegistry>> = IndexMap::new();
        by_family.insert(ChainFamily::Evm, evm.clone());
        by_family.insert(ChainFamily::Terra, terra.clone());
        by_family.insert(ChainFamily::Solana, solana.clone());

        Self {
            evm,
            terra,
            solana,
            by_family,
        }
    }

    /// Registries for every family, backed by memory
    pub fn in_memory() -> Self {
        Self::from_parts(
            NodeRegistry::in_memory(),
            NodeRegistry::in_memory(),
            NodeRegistry::in_memory(),
        )
    }

    /// Registries for every family with one JSON store file per family
    /// under `dir`
    pub async fn open_dir(dir: &Path, config: RegistryConfig) -> Result<Self> {
        async fn open<N: ChainNode>(dir: &Path, config: &RegistryConfig) -> Result<Arc<NodeRegistry<N>>> {
            let path = dir.join(format!("{}_nodes.json", N::FAMILY));
            let store: Arc<dyn NodeStore<N>> = Arc::new(FileNodeStore::<N>::open(path).await?);
            NodeRegistry::open(store, config.clone()).await
        }

        Ok(Self::from_parts(
            open(dir, &config).await?,
            open(dir, &config).await?,
            open(dir, &config).await?,
        ))
    }

    /// Registries for every family with explicit memory stores and config
    pub async fn with_config(config: RegistryConfig) -> Result<Self> {
        async fn open<N: ChainNode>(config: &RegistryConfig) -> Result<Arc<NodeRegistry<N>>> {
            let store: Arc<dyn NodeStore<N>> = Arc::new(MemoryNodeStore::<N>::new());
            NodeRegistry::open(store, config.clone()).await
        }

        Ok(Self::from_parts(
            open(&config).await?,
            open(&config).await?,
            open(&config).await?,
        ))
    }

    /// Registry for a family
    pub fn get(&self, family: ChainFamily) -> Result<Arc<dyn DynNodeRegistry>> {
        self.by_family
            .get(&family)
            .cloned()
            .ok_or_else(|| Error::UnknownChainFamily(family.to_string()))
    }

    /// Registry for a family given by name
    pub fn by_name(&self, family: &str) -> Result<Arc<dyn DynNodeRegistry>> {
        self.get(family.parse()?)
    }

    /// Register a chain with its family's registry
    pub fn register_chain(&self, chain: ChainRecord) -> Result<()> {
        self.get(chain.family)?.register_chain(chain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChainFamily, &Arc<dyn DynNodeRegistry>)> {
        self.by_family.iter().map(|(family, registry)| (*family, registry))
    }

    pub fn evm(&self) -> &Arc<NodeRegistry<EvmNode>> {
        &self.evm
    }

    pub fn terra(&self) -> &Arc<NodeRegistry<TerraNode>> {
        &self.terra
    }

    pub fn solana(&self) -> &Arc<NodeRegistry<SolanaNode>> {
        &self.solana
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NodeRecord;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    impl std::fmt::Debug for dyn DynNodeRegistry {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("DynNodeRegistry")
        }
    }

    /// Memory store that counts reads
    struct CountingStore {
        inner: MemoryNodeStore<TerraNode>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl NodeStore<TerraNode> for CountingStore {
        async fn insert(&self, record: NodeRecord<TerraNode>) -> Result<()> {
            self.inner.insert(record).await
        }
        async fn get(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<TerraNode>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(chain_id, name).await
        }
        async fn scan(&self, chain_id: &str, offset: usize, limit: usize) -> Result<Vec<NodeRecord<TerraNode>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.scan(chain_id, offset, limit).await
        }
        async fn count(&self, chain_id: &str) -> Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.count(chain_id).await
        }
        async fn set_enabled(&self, chain_id: &str, name: &str, enabled: bool) -> Result<Option<NodeRecord<TerraNode>>> {
            self.inner.set_enabled(chain_id, name, enabled).await
        }
        async fn delete(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<TerraNode>>> {
            self.inner.delete(chain_id, name).await
        }
        async fn max_id(&self) -> Result<u64> {
            self.inner.max_id().await
        }
    }

    #[tokio::test]
    async fn test_malformed_size_rejected_before_store_access() {
        let store = Arc::new(CountingStore {
            inner: MemoryNodeStore::new(),
            reads: AtomicUsize::new(0),
        });
        let registry = NodeRegistry::<TerraNode>::open(store.clone(), RegistryConfig::default())
            .await
            .unwrap();
        registry
            .register_chain(ChainRecord::new(ChainFamily::Terra, "terra-X"))
            .unwrap();
        let registry: Arc<dyn DynNodeRegistry> = registry;

        let result = registry.list_nodes("terra-X", Some("1"), Some("asd")).await;
        assert_matches!(result, Err(Error::InvalidPage(_)));
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);

        registry.list_nodes("terra-X", Some("1"), Some("1")).await.unwrap();
        assert!(store.reads.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_dispatch_by_family() {
        let registries = NodeRegistries::in_memory();
        registries
            .register_chain(ChainRecord::new(ChainFamily::Solana, "devnet"))
            .unwrap();

        let solana = registries.by_name("solana").unwrap();
        let created = solana
            .create_node(
                "devnet",
                json!({ "name": "sol-1", "solanaURL": "https://api.devnet.solana.com" }),
            )
            .await
            .unwrap();
        assert_eq!(created["name"], "sol-1");
        assert_eq!(created["enabled"], true);
        assert_eq!(created["solanaChainID"], "devnet");

        let page = solana.list_nodes("devnet", None, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(solana.node_count().await.unwrap(), 1);

        // Other families do not see the chain
        let evm = registries.get(ChainFamily::Evm).unwrap();
        assert_matches!(evm.chain("devnet"), Err(Error::ChainNotFound { .. }));
        assert_matches!(registries.by_name("bitcoin"), Err(Error::UnknownChainFamily(_)));
    }

    #[tokio::test]
    async fn test_malformed_input_is_validation_error() {
        let registries = NodeRegistries::in_memory();
        registries
            .register_chain(ChainRecord::new(ChainFamily::Terra, "terra-X"))
            .unwrap();
        let terra = registries.get(ChainFamily::Terra).unwrap();

        let result = terra.create_node("terra-X", json!({ "name": 7 })).await;
        assert_matches!(result, Err(Error::Validation { ref field, .. }) if field == "body");
    }

    #[tokio::test]
    async fn test_open_dir_persists_across_restart() {
        let tmp = TempDir::new().unwrap();

        {
            let registries = NodeRegistries::open_dir(tmp.path(), RegistryConfig::default())
                .await
                .unwrap();
            registries
                .register_chain(ChainRecord::new(ChainFamily::Evm, "1"))
                .unwrap();
            let evm = registries.get(ChainFamily::Evm).unwrap();
            evm.create_node("1", json!({ "name": "a", "wsURL": "ws://localhost:8546" }))
                .await
                .unwrap();
            evm.create_node("1", json!({ "name": "b", "wsURL": "ws://localhost:8547" }))
                .await
                .unwrap();
        }

        let registries = NodeRegistries::open_dir(tmp.path(), RegistryConfig::default())
            .await
            .unwrap();
        registries
            .register_chain(ChainRecord::new(ChainFamily::Evm, "1"))
            .unwrap();
        let evm = registries.get(ChainFamily::Evm).unwrap();
        let created = evm
            .create_node("1", json!({ "name": "c", "wsURL": "ws://localhost:8548" }))
            .await
            .unwrap();
        assert_eq!(created["id"], 3);

        let page = evm.list_nodes("1", None, None).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|v| v["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
