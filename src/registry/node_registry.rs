//! Per-Chain Node Registry
//!
//! A registry of RPC nodes for one chain family, generic over the family's
//! node type. Writes within a chain are serialized so name uniqueness
//! holds; reads never wait on writers and only observe complete records.

use super::events::RegistryEvent;
use super::pagination::{Page, PageRequest, PaginationLinks};
use super::store::MemoryNodeStore;
use crate::chains::ChainRecord;
use crate::domain::ports::{ChainFamily, ChainNode, NodeRecord, NodeStore};
use crate::error::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a node registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on any single store operation
    pub op_timeout: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(10),
            event_capacity: 1024,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Operation counters for a registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    pub creates: AtomicU64,
    pub rejected_creates: AtomicU64,
    pub enables: AtomicU64,
    pub disables: AtomicU64,
    pub deletes: AtomicU64,
}

impl RegistryStats {
    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            creates: self.creates.load(Ordering::Relaxed),
            rejected_creates: self.rejected_creates.load(Ordering::Relaxed),
            enables: self.enables.load(Ordering::Relaxed),
            disables: self.disables.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStatsSnapshot {
    pub creates: u64,
    pub rejected_creates: u64,
    pub enables: u64,
    pub disables: u64,
    pub deletes: u64,
}

// =============================================================================
// Node Registry
// =============================================================================

/// Registry of RPC nodes for chain family `N::FAMILY`
pub struct NodeRegistry<N: ChainNode> {
    store: Arc<dyn NodeStore<N>>,
    /// Chains known to this family, in registration order
    chains: RwLock<IndexMap<String, ChainRecord>>,
    /// One write lock per chain scope
    write_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Last id handed out
    sequence: AtomicU64,
    stats: RegistryStats,
    event_sender: broadcast::Sender<RegistryEvent>,
    config: RegistryConfig,
}

impl<N: ChainNode> NodeRegistry<N> {
    /// Create a registry over an existing store, resuming its id sequence
    pub async fn open(store: Arc<dyn NodeStore<N>>, config: RegistryConfig) -> Result<Arc<Self>> {
        let high_water = tokio::time::timeout(config.op_timeout, store.max_id())
            .await
            .map_err(|_| Error::Timeout(config.op_timeout))??;

        let (event_sender, _) = broadcast::channel(config.event_capacity.max(1));

        info!(
            family = %N::FAMILY,
            high_water,
            "Node registry opened"
        );

        Ok(Arc::new(Self {
            store,
            chains: RwLock::new(IndexMap::new()),
            write_locks: DashMap::new(),
            sequence: AtomicU64::new(high_water),
            stats: RegistryStats::default(),
            event_sender,
            config,
        }))
    }

    /// Create an empty registry backed by memory
    pub fn in_memory() -> Arc<Self> {
        let (event_sender, _) = broadcast::channel(RegistryConfig::default().event_capacity);
        Arc::new(Self {
            store: Arc::new(MemoryNodeStore::<N>::new()),
            chains: RwLock::new(IndexMap::new()),
            write_locks: DashMap::new(),
            sequence: AtomicU64::new(0),
            stats: RegistryStats::default(),
            event_sender,
            config: RegistryConfig::default(),
        })
    }

    pub fn family(&self) -> ChainFamily {
        N::FAMILY
    }

    /// Get an event receiver
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run a store operation under the configured timeout
    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.op_timeout, op)
            .await
            .map_err(|_| Error::Timeout(self.config.op_timeout))?
    }

    fn chain_lock(&self, chain_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(chain_id.to_string())
            .or_default()
            .clone()
    }

    fn base_path(&self, chain_id: &str) -> String {
        format!(
            "/v2/chains/{}/{}/nodes",
            N::FAMILY,
            urlencoding::encode(chain_id)
        )
    }

    // =========================================================================
    // Chains
    // =========================================================================

    /// Add a chain to this family; chains are registered at startup
    pub fn register_chain(&self, chain: ChainRecord) -> Result<()> {
        if chain.family != N::FAMILY {
            return Err(Error::Configuration(format!(
                "chain {} belongs to {}, not {}",
                chain.id, chain.family, N::FAMILY
            )));
        }
        if chain.id.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "{} chain id must not be empty",
                N::FAMILY
            )));
        }

        let mut chains = self.chains.write();
        if chains.contains_key(&chain.id) {
            return Err(Error::Configuration(format!(
                "{} chain {} registered twice",
                N::FAMILY, chain.id
            )));
        }

        info!(family = %N::FAMILY, chain_id = %chain.id, "Chain registered");
        let _ = self.event_sender.send(RegistryEvent::ChainRegistered {
            family: N::FAMILY,
            chain_id: chain.id.clone(),
        });
        chains.insert(chain.id.clone(), chain);
        Ok(())
    }

    /// Look up a chain by id
    pub fn chain(&self, chain_id: &str) -> Result<ChainRecord> {
        self.chains
            .read()
            .get(chain_id)
            .cloned()
            .ok_or_else(|| Error::ChainNotFound {
                family: N::FAMILY.to_string(),
                chain_id: chain_id.to_string(),
            })
    }

    /// Ids of every registered chain
    pub fn chain_ids(&self) -> Vec<String> {
        self.chains.read().keys().cloned().collect()
    }

    /// One page of chains in registration order
    pub fn list_chains(&self, request: &PageRequest) -> Page<ChainRecord> {
        let all: Vec<ChainRecord> = self.chains.read().values().cloned().collect();
        Page::from_ordered(all, *request, &format!("/v2/chains/{}", N::FAMILY))
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Validate `input` and add a node to `chain_id`
    pub async fn create_node(&self, chain_id: &str, input: N::Input) -> Result<NodeRecord<N>> {
        self.chain(chain_id)?;

        let node = N::from_input(chain_id, input).map_err(|e| {
            self.stats.rejected_creates.fetch_add(1, Ordering::Relaxed);
            e
        })?;

        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock().await;

        if self.bounded(self.store.get(chain_id, node.name())).await?.is_some() {
            self.stats.rejected_creates.fetch_add(1, Ordering::Relaxed);
            return Err(Error::validation(
                "name",
                format!("{} is already in use on chain {}", node.name(), chain_id),
            ));
        }

        let record = NodeRecord {
            id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            enabled: true,
            created_at: Utc::now(),
            node,
        };
        self.bounded(self.store.insert(record.clone())).await?;

        self.stats.creates.fetch_add(1, Ordering::Relaxed);
        info!(
            family = %N::FAMILY,
            chain_id,
            name = record.name(),
            id = record.id,
            "Node created"
        );
        let _ = self.event_sender.send(RegistryEvent::NodeCreated {
            family: N::FAMILY,
            chain_id: chain_id.to_string(),
            name: record.name().to_string(),
            id: record.id,
        });

        Ok(record)
    }

    /// Get a node by name
    pub async fn get_node(&self, chain_id: &str, name: &str) -> Result<NodeRecord<N>> {
        self.chain(chain_id)?;
        self.bounded(self.store.get(chain_id, name))
            .await?
            .ok_or_else(|| Error::NodeNotFound {
                chain_id: chain_id.to_string(),
                name: name.to_string(),
            })
    }

    /// One page of a chain's nodes in creation order
    pub async fn list_nodes(&self, chain_id: &str, request: &PageRequest) -> Result<Page<NodeRecord<N>>> {
        self.chain(chain_id)?;

        let (total, items) = self
            .bounded(self.store.scan_page(chain_id, request.offset(), request.limit()))
            .await?;

        debug!(
            family = %N::FAMILY,
            chain_id,
            page = request.page(),
            size = request.size(),
            returned = items.len(),
            "Listed nodes"
        );

        Ok(Page {
            items,
            total,
            request: *request,
            links: PaginationLinks::build(&self.base_path(chain_id), request, total),
        })
    }

    /// Enabled nodes of a chain, in creation order
    pub async fn enabled_nodes(&self, chain_id: &str) -> Result<Vec<NodeRecord<N>>> {
        self.chain(chain_id)?;
        let nodes = self
            .bounded(self.store.scan(chain_id, 0, usize::MAX))
            .await?;
        Ok(nodes.into_iter().filter(|r| r.enabled).collect())
    }

    /// Enable or disable a node
    pub async fn set_enabled(&self, chain_id: &str, name: &str, enabled: bool) -> Result<NodeRecord<N>> {
        self.chain(chain_id)?;

        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock().await;

        let current = self
            .bounded(self.store.get(chain_id, name))
            .await?
            .ok_or_else(|| Error::NodeNotFound {
                chain_id: chain_id.to_string(),
                name: name.to_string(),
            })?;
        if current.enabled == enabled {
            return Ok(current);
        }

        let updated = self
            .bounded(self.store.set_enabled(chain_id, name, enabled))
            .await?
            .ok_or_else(|| Error::Storage(format!("node {}/{} vanished during update", chain_id, name)))?;

        let (family, chain_id, name) = (N::FAMILY, chain_id.to_string(), name.to_string());
        let event = if enabled {
            self.stats.enables.fetch_add(1, Ordering::Relaxed);
            info!(family = %family, chain_id = %chain_id, name = %name, "Node enabled");
            RegistryEvent::NodeEnabled { family, chain_id, name }
        } else {
            self.stats.disables.fetch_add(1, Ordering::Relaxed);
            warn!(family = %family, chain_id = %chain_id, name = %name, "Node disabled");
            RegistryEvent::NodeDisabled { family, chain_id, name }
        };
        let _ = self.event_sender.send(event);

        Ok(updated)
    }

    /// Delete a node; deletion is terminal
    pub async fn delete_node(&self, chain_id: &str, name: &str) -> Result<NodeRecord<N>> {
        self.chain(chain_id)?;

        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock().await;

        let removed = self
            .bounded(self.store.delete(chain_id, name))
            .await?
            .ok_or_else(|| Error::NodeNotFound {
                chain_id: chain_id.to_string(),
                name: name.to_string(),
            })?;

        self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        info!(family = %N::FAMILY, chain_id, name, id = removed.id, "Node deleted");
        let _ = self.event_sender.send(RegistryEvent::NodeDeleted {
            family: N::FAMILY,
            chain_id: chain_id.to_string(),
            name: name.to_string(),
        });

        Ok(removed)
    }

    /// Number of nodes on a chain
    pub async fn node_count(&self, chain_id: &str) -> Result<usize> {
        self.bounded(self.store.count(chain_id)).await
    }
}
