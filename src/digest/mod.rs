//! Config Digest Module
//!
//! Deterministic identity binding for protocol instances: the digest
//! layout, the prefix table, and the custom-endpoint digester.

pub mod digester;
pub mod prefix;
pub mod types;

pub use digester::*;
pub use prefix::*;
pub use types::*;
