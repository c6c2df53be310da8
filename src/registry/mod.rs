//! Node Registry Module
//!
//! Per-chain registries of trusted RPC endpoints, generic over the chain
//! family, with stable pagination, lifecycle events and pluggable storage.

pub mod dyn_registry;
pub mod events;
pub mod node_registry;
pub mod pagination;
pub mod store;

pub use dyn_registry::*;
pub use events::*;
pub use node_registry::*;
pub use pagination::*;
pub use store::{FileNodeStore, MemoryNodeStore};
