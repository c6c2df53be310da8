//! OCR Node Core
//!
//! Binds off-chain reporting protocol instances to their configuration via
//! prefixed config digests, and keeps per-chain registries of the RPC
//! nodes the oracle trusts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Admin API (axum) / CLI                            │
//! │        /v2/chains/{family}/{chain}/nodes    ocr-node nodes ... list     │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │ JSON
//!                    ┌────────────┴────────────┐
//!                    │     NodeRegistries      │  family → DynNodeRegistry
//!                    └────────────┬────────────┘
//!        ┌────────────────────────┼────────────────────────┐
//!  ┌─────┴──────────┐   ┌─────────┴────────┐   ┌───────────┴──────┐
//!  │ NodeRegistry   │   │ NodeRegistry     │   │ NodeRegistry     │
//!  │ <EvmNode>      │   │ <TerraNode>      │   │ <SolanaNode>     │
//!  └─────┬──────────┘   └─────────┬────────┘   └───────────┬──────┘
//!        └────────────────────────┼────────────────────────┘
//!                      NodeStore (memory / JSON file)
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PrefixRegistry (class → prefix)  ──►  CustomEndpointDigester           │
//! │  sha256(name ‖ target ‖ payload), bytes [0..2] = prefix                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`digest`]: Config digest computation and the prefix table
//! - [`registry`]: Per-chain node registries, stores and pagination
//! - [`chains`]: Chain family node types and validation
//! - [`api`]: Admin REST API and metrics
//! - [`cli`]: Command line client
//! - [`config`]: YAML node configuration
//! - [`domain`]: Core traits
//! - [`error`]: Error types and handling

pub mod api;
pub mod chains;
pub mod cli;
pub mod config;
pub mod digest;
pub mod domain;
pub mod error;
pub mod registry;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig};

pub use chains::{ChainRecord, EvmNode, NewEvmNode, NewSolanaNode, NewTerraNode, SolanaNode, TerraNode};

pub use config::NodeConfig;

pub use digest::{
    ConfigDigest, ConfigDigestPrefix, ContractConfig, CustomEndpointDigester, EndpointIdentity,
    PrefixRegistry, PrefixRegistryBuilder, CONFIG_DIGEST_PREFIX_CUSTOM_ENDPOINT,
};

pub use domain::ports::{ChainFamily, ChainNode, NodeRecord, NodeStore, OffchainConfigDigester};

pub use error::{Error, Result};

pub use registry::{
    DynNodeRegistry, FileNodeStore, MemoryNodeStore, NodeRegistries, NodeRegistry, Page,
    PageRequest, RegistryConfig, RegistryEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
