//! API Module
//!
//! Admin REST API over the node registries, with health and Prometheus
//! metrics endpoints.

pub mod metrics;
pub mod rest;
pub mod server;

pub use metrics::ApiMetrics;
pub use rest::*;
pub use server::*;
