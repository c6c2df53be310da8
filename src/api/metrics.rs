//! Prometheus Exposition
//!
//! Gauges are refreshed from the registries at scrape time, so nothing on
//! the write path touches prometheus types.

use crate::error::{Error, Result};
use crate::registry::NodeRegistries;
use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

/// Metric families served on `/metrics`
pub struct ApiMetrics {
    registry: Registry,
    nodes: IntGaugeVec,
    chains: IntGaugeVec,
    operations: IntGaugeVec,
}

fn prom_err(e: prometheus::Error) -> Error {
    Error::Internal(format!("prometheus: {}", e))
}

impl ApiMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let nodes = IntGaugeVec::new(
            Opts::new("ocr_node_rpc_nodes", "Registered RPC nodes per chain family"),
            &["family"],
        )
        .map_err(prom_err)?;
        let chains = IntGaugeVec::new(
            Opts::new("ocr_node_chains", "Configured chains per chain family"),
            &["family"],
        )
        .map_err(prom_err)?;
        let operations = IntGaugeVec::new(
            Opts::new(
                "ocr_node_registry_operations",
                "Registry write operations since startup",
            ),
            &["family", "op"],
        )
        .map_err(prom_err)?;

        registry.register(Box::new(nodes.clone())).map_err(prom_err)?;
        registry.register(Box::new(chains.clone())).map_err(prom_err)?;
        registry.register(Box::new(operations.clone())).map_err(prom_err)?;

        Ok(Self {
            registry,
            nodes,
            chains,
            operations,
        })
    }

    /// Refresh gauges and encode in the text exposition format
    pub async fn render(&self, registries: &NodeRegistries) -> Result<String> {
        for (family, registry) in registries.iter() {
            let family = family.as_str();
            let count = registry.node_count().await?;
            self.nodes.with_label_values(&[family]).set(count as i64);
            self.chains
                .with_label_values(&[family])
                .set(registry.chain_ids().len() as i64);

            let stats = registry.stats();
            for (op, value) in [
                ("create", stats.creates),
                ("rejected_create", stats.rejected_creates),
                ("enable", stats.enables),
                ("disable", stats.disables),
                ("delete", stats.deletes),
            ] {
                self.operations
                    .with_label_values(&[family, op])
                    .set(value as i64);
            }
        }

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(prom_err)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainRecord;
    use crate::domain::ports::ChainFamily;
    use serde_json::json;

    #[tokio::test]
    async fn test_render_reflects_registry() {
        let registries = NodeRegistries::in_memory();
        registries
            .register_chain(ChainRecord::new(ChainFamily::Terra, "terra-X"))
            .unwrap();
        let terra = registries.get(ChainFamily::Terra).unwrap();
        terra
            .create_node("terra-X", json!({ "name": "a", "tendermintURL": "http://a:26657" }))
            .await
            .unwrap();

        let metrics = ApiMetrics::new().unwrap();
        let text = metrics.render(&registries).await.unwrap();

        assert!(text.contains("ocr_node_rpc_nodes{family=\"terra\"} 1"));
        assert!(text.contains("ocr_node_rpc_nodes{family=\"evm\"} 0"));
        assert!(text.contains("ocr_node_chains{family=\"terra\"} 1"));
        assert!(text.contains("ocr_node_registry_operations{family=\"terra\",op=\"create\"} 1"));
    }
}
