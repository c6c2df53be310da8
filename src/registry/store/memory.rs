//! In-Memory Node Store
//!
//! Per-chain ordered maps behind a single lock, so an inserted record is
//! visible to readers only once complete.

use crate::domain::ports::{ChainNode, NodeRecord, NodeStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Contents of a node store
#[derive(Debug, Clone)]
pub(crate) struct StoreState<N> {
    /// chain id → (record id → record)
    pub chains: HashMap<String, BTreeMap<u64, NodeRecord<N>>>,
    /// (chain id, name) → record id
    pub names: HashMap<(String, String), u64>,
    /// Highest id ever inserted
    pub high_water: u64,
}

impl<N> Default for StoreState<N> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
            names: HashMap::new(),
            high_water: 0,
        }
    }
}

impl<N: ChainNode> StoreState<N> {
    pub fn from_records(records: Vec<NodeRecord<N>>, high_water: u64) -> Result<Self> {
        let mut state = Self {
            high_water,
            ..Default::default()
        };
        for record in records {
            state.insert(record)?;
        }
        Ok(state)
    }

    fn key(chain_id: &str, name: &str) -> (String, String) {
        (chain_id.to_string(), name.to_string())
    }

    pub fn insert(&mut self, record: NodeRecord<N>) -> Result<()> {
        let key = Self::key(record.chain_id(), record.name());
        if self.names.contains_key(&key) {
            return Err(Error::validation(
                "name",
                format!("{} is already in use on chain {}", key.1, key.0),
            ));
        }
        let chain = self.chains.entry(key.0.clone()).or_default();
        if chain.contains_key(&record.id) {
            return Err(Error::Storage(format!("duplicate record id {}", record.id)));
        }

        self.high_water = self.high_water.max(record.id);
        self.names.insert(key, record.id);
        chain.insert(record.id, record);
        Ok(())
    }

    pub fn get(&self, chain_id: &str, name: &str) -> Option<&NodeRecord<N>> {
        let id = self.names.get(&Self::key(chain_id, name))?;
        self.chains.get(chain_id)?.get(id)
    }

    pub fn set_enabled(&mut self, chain_id: &str, name: &str, enabled: bool) -> Option<NodeRecord<N>> {
        let id = *self.names.get(&Self::key(chain_id, name))?;
        let record = self.chains.get_mut(chain_id)?.get_mut(&id)?;
        record.enabled = enabled;
        Some(record.clone())
    }

    pub fn delete(&mut self, chain_id: &str, name: &str) -> Option<NodeRecord<N>> {
        let id = self.names.remove(&Self::key(chain_id, name))?;
        let chain = self.chains.get_mut(chain_id)?;
        let record = chain.remove(&id);
        if chain.is_empty() {
            self.chains.remove(chain_id);
        }
        record
    }

    pub fn scan(&self, chain_id: &str, offset: usize, limit: usize) -> Vec<NodeRecord<N>> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.values().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, chain_id: &str) -> usize {
        self.chains.get(chain_id).map_or(0, BTreeMap::len)
    }

    /// All records ordered by id
    pub fn records(&self) -> Vec<NodeRecord<N>> {
        let mut all: Vec<_> = self.chains.values().flat_map(|c| c.values().cloned()).collect();
        all.sort_by_key(|r| r.id);
        all
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Node store held entirely in memory
pub struct MemoryNodeStore<N> {
    state: RwLock<StoreState<N>>,
}

impl<N: ChainNode> MemoryNodeStore<N> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    pub(crate) fn from_state(state: StoreState<N>) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current contents
    pub(crate) fn state(&self) -> StoreState<N> {
        self.state.read().clone()
    }

    pub(crate) fn replace(&self, state: StoreState<N>) {
        *self.state.write() = state;
    }

    /// Total records across chains
    pub fn len(&self) -> usize {
        self.state.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<N: ChainNode> Default for MemoryNodeStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<N: ChainNode> NodeStore<N> for MemoryNodeStore<N> {
    async fn insert(&self, record: NodeRecord<N>) -> Result<()> {
        self.state.write().insert(record)
    }

    async fn get(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>> {
        Ok(self.state.read().get(chain_id, name).cloned())
    }

    async fn scan(&self, chain_id: &str, offset: usize, limit: usize) -> Result<Vec<NodeRecord<N>>> {
        Ok(self.state.read().scan(chain_id, offset, limit))
    }

    async fn count(&self, chain_id: &str) -> Result<usize> {
        Ok(self.state.read().count(chain_id))
    }

    async fn scan_page(
        &self,
        chain_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(usize, Vec<NodeRecord<N>>)> {
        let state = self.state.read();
        Ok((state.count(chain_id), state.scan(chain_id, offset, limit)))
    }

    async fn set_enabled(
        &self,
        chain_id: &str,
        name: &str,
        enabled: bool,
    ) -> Result<Option<NodeRecord<N>>> {
        Ok(self.state.write().set_enabled(chain_id, name, enabled))
    }

    async fn delete(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>> {
        Ok(self.state.write().delete(chain_id, name))
    }

    async fn max_id(&self) -> Result<u64> {
        Ok(self.state.read().high_water)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::TerraNode;
    use chrono::Utc;

    fn terra_record(id: u64, chain: &str, name: &str) -> NodeRecord<TerraNode> {
        NodeRecord {
            id,
            enabled: true,
            created_at: Utc::now(),
            node: TerraNode {
                name: name.to_string(),
                terra_chain_id: chain.to_string(),
                tendermint_url: format!("http://{}.example.com/", name),
            },
        }
    }

    #[tokio::test]
    async fn test_basic_operations() {
        let store = MemoryNodeStore::new();

        store.insert(terra_record(1, "terra-X", "node-A")).await.unwrap();
        store.insert(terra_record(2, "terra-X", "node-B")).await.unwrap();
        store.insert(terra_record(3, "terra-Y", "node-A")).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.count("terra-X").await.unwrap(), 2);
        assert_eq!(store.max_id().await.unwrap(), 3);

        let scanned = store.scan("terra-X", 1, 10).await.unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].name(), "node-B");

        let disabled = store.set_enabled("terra-X", "node-A", false).await.unwrap().unwrap();
        assert!(!disabled.enabled);

        let deleted = store.delete("terra-X", "node-A").await.unwrap();
        assert!(deleted.is_some());
        assert!(store.get("terra-X", "node-A").await.unwrap().is_none());
        assert!(store.get("terra-Y", "node-A").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let store = MemoryNodeStore::new();
        store.insert(terra_record(1, "terra-X", "node-A")).await.unwrap();
        let result = store.insert(terra_record(2, "terra-X", "node-A")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_high_water_survives_delete() {
        let store = MemoryNodeStore::new();
        store.insert(terra_record(5, "terra-X", "node-A")).await.unwrap();
        store.delete("terra-X", "node-A").await.unwrap();
        assert_eq!(store.max_id().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_scan_page_matches_count() {
        let store = MemoryNodeStore::new();
        for (id, name) in [(1, "node-A"), (2, "node-B"), (3, "node-C")] {
            store.insert(terra_record(id, "terra-X", name)).await.unwrap();
        }
        store.insert(terra_record(4, "terra-Y", "node-A")).await.unwrap();

        let (total, items) = store.scan_page("terra-X", 2, 25).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "node-C");

        let (total, items) = store.scan_page("terra-Z", 0, 25).await.unwrap();
        assert_eq!(total, 0);
        assert!(items.is_empty());
    }
}
