//! Registry Events
//!
//! Events emitted by the node registry so protocol workers can react to
//! endpoint set changes without polling.

use crate::domain::ports::ChainFamily;
use serde::{Deserialize, Serialize};

/// Events emitted by the node registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A chain was added at startup
    ChainRegistered { family: ChainFamily, chain_id: String },

    /// A node was created (enabled)
    NodeCreated {
        family: ChainFamily,
        chain_id: String,
        name: String,
        id: u64,
    },

    /// A disabled node was enabled
    NodeEnabled {
        family: ChainFamily,
        chain_id: String,
        name: String,
    },

    /// An enabled node was disabled
    NodeDisabled {
        family: ChainFamily,
        chain_id: String,
        name: String,
    },

    /// A node was deleted
    NodeDeleted {
        family: ChainFamily,
        chain_id: String,
        name: String,
    },
}

impl RegistryEvent {
    /// Chain the event refers to
    pub fn chain_id(&self) -> &str {
        match self {
            RegistryEvent::ChainRegistered { chain_id, .. }
            | RegistryEvent::NodeCreated { chain_id, .. }
            | RegistryEvent::NodeEnabled { chain_id, .. }
            | RegistryEvent::NodeDisabled { chain_id, .. }
            | RegistryEvent::NodeDeleted { chain_id, .. } => chain_id,
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            RegistryEvent::ChainRegistered { family, .. }
            | RegistryEvent::NodeCreated { family, .. }
            | RegistryEvent::NodeEnabled { family, .. }
            | RegistryEvent::NodeDisabled { family, .. }
            | RegistryEvent::NodeDeleted { family, .. } => *family,
        }
    }

    /// Node name if this is a node-level event
    pub fn node_name(&self) -> Option<&str> {
        match self {
            RegistryEvent::NodeCreated { name, .. }
            | RegistryEvent::NodeEnabled { name, .. }
            | RegistryEvent::NodeDisabled { name, .. }
            | RegistryEvent::NodeDeleted { name, .. } => Some(name),
            RegistryEvent::ChainRegistered { .. } => None,
        }
    }

    /// Whether the usable endpoint set of the chain changed
    pub fn changes_endpoint_set(&self) -> bool {
        matches!(
            self,
            RegistryEvent::NodeCreated { .. }
                | RegistryEvent::NodeEnabled { .. }
                | RegistryEvent::NodeDisabled { .. }
                | RegistryEvent::NodeDeleted { .. }
        )
    }
}
