//! File-Backed Node Store
//!
//! Keeps the working set in a [`MemoryNodeStore`] and persists a JSON
//! snapshot after every mutation. The snapshot is written to a temporary
//! file and renamed into place, and the in-memory state only changes once
//! the write has succeeded.

use super::memory::{MemoryNodeStore, StoreState};
use crate::domain::ports::{ChainNode, NodeRecord, NodeStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "N: ChainNode"))]
struct Snapshot<N> {
    high_water: u64,
    nodes: Vec<NodeRecord<N>>,
}

/// Node store persisted to a single JSON file
pub struct FileNodeStore<N> {
    path: PathBuf,
    inner: MemoryNodeStore<N>,
    /// Serializes mutations so snapshots are written in order
    write_lock: Mutex<()>,
}

impl<N: ChainNode> FileNodeStore<N> {
    /// Open the store at `path`, loading any existing snapshot
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| storage_err(&path, e))?;
            }
        }

        let state = match fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot<N> = serde_json::from_slice(&bytes).map_err(|e| {
                    Error::Storage(format!("corrupt node store {}: {}", path.display(), e))
                })?;
                info!(
                    "Loaded {} {} nodes from {}",
                    snapshot.nodes.len(),
                    N::FAMILY,
                    path.display()
                );
                StoreState::from_records(snapshot.nodes, snapshot.high_water)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(storage_err(&path, e)),
        };

        Ok(Self {
            path,
            inner: MemoryNodeStore::from_state(state),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the state, persist it, then publish it
    async fn commit<T>(&self, mutate: impl FnOnce(&mut StoreState<N>) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock().await;

        let mut state = self.inner.state();
        let out = mutate(&mut state)?;
        self.write_snapshot(&state).await?;
        self.inner.replace(state);

        Ok(out)
    }

    async fn write_snapshot(&self, state: &StoreState<N>) -> Result<()> {
        let snapshot = Snapshot {
            high_water: state.high_water,
            nodes: state.records(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &bytes).await.map_err(|e| storage_err(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_err(&self.path, e))?;

        debug!("Persisted {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

fn storage_err(path: &Path, e: std::io::Error) -> Error {
    Error::Storage(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl<N: ChainNode> NodeStore<N> for FileNodeStore<N> {
    async fn insert(&self, record: NodeRecord<N>) -> Result<()> {
        self.commit(|state| state.insert(record)).await
    }

    async fn get(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>> {
        self.inner.get(chain_id, name).await
    }

    async fn scan(&self, chain_id: &str, offset: usize, limit: usize) -> Result<Vec<NodeRecord<N>>> {
        self.inner.scan(chain_id, offset, limit).await
    }

    async fn count(&self, chain_id: &str) -> Result<usize> {
        self.inner.count(chain_id).await
    }

    async fn scan_page(
        &self,
        chain_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(usize, Vec<NodeRecord<N>>)> {
        self.inner.scan_page(chain_id, offset, limit).await
    }

    async fn set_enabled(
        &self,
        chain_id: &str,
        name: &str,
        enabled: bool,
    ) -> Result<Option<NodeRecord<N>>> {
        self.commit(|state| Ok(state.set_enabled(chain_id, name, enabled)))
            .await
    }

    async fn delete(&self, chain_id: &str, name: &str) -> Result<Option<NodeRecord<N>>> {
        self.commit(|state| Ok(state.delete(chain_id, name))).await
    }

    async fn max_id(&self) -> Result<u64> {
        self.inner.max_id().await
    }
}
