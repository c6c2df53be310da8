//! Node Store Backends
//!
//! Implementations of [`NodeStore`](crate::domain::ports::NodeStore) used
//! by the node registry.

mod file;
mod memory;

pub use file::FileNodeStore;
pub use memory::MemoryNodeStore;
