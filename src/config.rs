//! Node Configuration
//!
//! YAML configuration for the node: endpoint classes and their digest
//! prefixes, protocol endpoints to bind, chains per family with seed nodes,
//! node store location and the admin API listener.

use crate::chains::ChainRecord;
use crate::digest::{CustomEndpointDigester, EndpointIdentity, PrefixRegistry, PrefixRegistryBuilder};
use crate::digest::CUSTOM_ENDPOINT_CLASS;
use crate::domain::ports::ChainFamily;
use crate::error::{Error, Result};
use crate::registry::{NodeRegistries, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// =============================================================================
// Sections
// =============================================================================

/// Admin API listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    /// REST API bind address
    pub addr: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:6688".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Node store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Directory for per-family node files; memory only when absent
    pub dir: Option<PathBuf>,
    /// Upper bound on a single store operation in milliseconds
    pub op_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            op_timeout_ms: 10_000,
        }
    }
}

/// An endpoint class and its digest prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointClassConfig {
    pub name: String,
    pub prefix: u16,
}

/// A protocol endpoint whose digest is computed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default = "default_class")]
    pub class: String,
    #[serde(flatten)]
    pub identity: EndpointIdentity,
}

fn default_class() -> String {
    CUSTOM_ENDPOINT_CLASS.to_string()
}

/// A chain and the nodes to seed on it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Family-specific chain settings
    #[serde(default)]
    pub config: serde_json::Value,
    /// Family-specific node inputs
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Node Config
// =============================================================================

/// Top-level node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    /// Endpoint classes in addition to the built-in ones
    pub endpoint_classes: Vec<EndpointClassConfig>,
    pub endpoints: Vec<EndpointConfig>,
    pub chains: BTreeMap<ChainFamily, Vec<ChainConfig>>,
}

impl NodeConfig {
    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural constraints not expressed by types
    pub fn validate(&self) -> Result<()> {
        if self.store.op_timeout_ms == 0 {
            return Err(Error::Configuration("store.opTimeoutMs must be positive".into()));
        }
        for (family, chains) in &self.chains {
            let mut seen = HashSet::new();
            for chain in chains {
                if chain.id.trim().is_empty() {
                    return Err(Error::Configuration(format!("{} chain with empty id", family)));
                }
                if !seen.insert(chain.id.as_str()) {
                    return Err(Error::Configuration(format!(
                        "{} chain {} listed twice",
                        family, chain.id
                    )));
                }
            }
        }
        // Surfaces prefix collisions early
        self.prefix_registry()?;
        Ok(())
    }

    /// Build the frozen endpoint class → prefix table
    pub fn prefix_registry(&self) -> Result<Arc<PrefixRegistry>> {
        let mut builder = PrefixRegistryBuilder::with_builtin_classes();
        for class in &self.endpoint_classes {
            builder.register(class.name.clone(), class.prefix)?;
        }
        Ok(builder.build())
    }

    /// Digesters for the configured endpoints
    pub fn digesters(&self, prefixes: &PrefixRegistry) -> Result<Vec<(String, CustomEndpointDigester)>> {
        self.endpoints
            .iter()
            .map(|endpoint| {
                let digester = prefixes.digester(&endpoint.class, endpoint.identity.clone())?;
                Ok((endpoint.class.clone(), digester))
            })
            .collect()
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            op_timeout: Duration::from_millis(self.store.op_timeout_ms),
            ..Default::default()
        }
    }

    /// Open the node registries, register chains and seed nodes
    ///
    /// Seed nodes whose name already exists (from a previous run) are left
    /// as they are.
    pub async fn build_registries(&self) -> Result<NodeRegistries> {
        let registries = match &self.store.dir {
            Some(dir) => NodeRegistries::open_dir(dir, self.registry_config()).await?,
            None => NodeRegistries::with_config(self.registry_config()).await?,
        };

        for (family, chains) in &self.chains {
            let registry = registries.get(*family)?;
            for chain in chains {
                registry.register_chain(
                    ChainRecord::new(*family, chain.id.clone())
                        .with_enabled(chain.enabled)
                        .with_config(chain.config.clone()),
                )?;

                for input in &chain.nodes {
                    // Stored names are trimmed on create
                    let name = input
                        .get("name")
                        .and_then(|n| n.as_str())
                        .map(str::trim)
                        .unwrap_or_default();
                    match registry.get_node(&chain.id, name).await {
                        Ok(_) => debug!(family = %family, chain_id = %chain.id, name, "Seed node already present"),
                        Err(Error::NodeNotFound { .. }) => {
                            registry.create_node(&chain.id, input.clone()).await?;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(registries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::OffchainConfigDigester;
    use crate::digest::ContractConfig;
    use assert_matches::assert_matches;

    const SAMPLE: &str = r#"
api:
  addr: 127.0.0.1:6688
store:
  opTimeoutMs: 2500
endpointClasses:
  - name: custom-endpoint-staging
    prefix: 260
endpoints:
  - endpointName: dydx
    endpointTarget: bridge
    payloadType: ETHUSD
  - class: custom-endpoint-staging
    endpointName: dydx
    endpointTarget: bridge
    payloadType: ETHUSD
chains:
  terra:
    - id: terra-X
      config:
        fallbackGasPriceULuna: "9.999"
      nodes:
        - name: node-A
          tendermintURL: http://a.example.com:26657
        - name: node-B
          tendermintURL: http://b.example.com:26657
  evm:
    - id: "1"
      enabled: false
"#;

    #[test]
    fn test_parse_sample() {
        let config = NodeConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.api.addr, "127.0.0.1:6688");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.registry_config().op_timeout, Duration::from_millis(2500));
        assert_eq!(config.endpoints[0].class, CUSTOM_ENDPOINT_CLASS);
        assert_eq!(config.chains[&ChainFamily::Terra][0].nodes.len(), 2);
        assert!(!config.chains[&ChainFamily::Evm][0].enabled);
    }

    #[test]
    fn test_digesters_use_class_prefixes() {
        let config = NodeConfig::from_yaml_str(SAMPLE).unwrap();
        let prefixes = config.prefix_registry().unwrap();
        let digesters = config.digesters(&prefixes).unwrap();

        let cfg = ContractConfig::default();
        let prod = digesters[0].1.config_digest(&cfg).unwrap();
        let staging = digesters[1].1.config_digest(&cfg).unwrap();
        assert_eq!(&prod.as_bytes()[..2], &[0x00, 0x04]);
        assert_eq!(&staging.as_bytes()[..2], &[0x01, 0x04]);
        assert_ne!(prod, staging);
    }

    #[test]
    fn test_prefix_collision_in_config() {
        let raw = r#"
endpointClasses:
  - name: other
    prefix: 4
"#;
        assert_matches!(NodeConfig::from_yaml_str(raw), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_duplicate_chain_rejected() {
        let raw = r#"
chains:
  solana:
    - id: devnet
    - id: devnet
"#;
        assert_matches!(NodeConfig::from_yaml_str(raw), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_unknown_family_rejected() {
        let raw = r#"
chains:
  bitcoin:
    - id: main
"#;
        assert_matches!(NodeConfig::from_yaml_str(raw), Err(Error::YamlParse(_)));
    }

    #[tokio::test]
    async fn test_build_registries_seeds_nodes() {
        let config = NodeConfig::from_yaml_str(SAMPLE).unwrap();
        let registries = config.build_registries().await.unwrap();

        let terra = registries.get(ChainFamily::Terra).unwrap();
        let page = terra.list_nodes("terra-X", Some("1"), Some("1")).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0]["name"], "node-A");

        let chain = terra.chain("terra-X").unwrap();
        assert_eq!(chain.config["fallbackGasPriceULuna"], "9.999");
        assert!(!registries.get(ChainFamily::Evm).unwrap().chain("1").unwrap().enabled);
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent_across_restarts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = NodeConfig::from_yaml_str(SAMPLE).unwrap();
        config.store.dir = Some(tmp.path().to_path_buf());

        config.build_registries().await.unwrap();
        let registries = config.build_registries().await.unwrap();

        let terra = registries.get(ChainFamily::Terra).unwrap();
        assert_eq!(terra.node_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_padded_seed_name_survives_restart() {
        let yaml = r#"
chains:
  terra:
    - id: terra-X
      nodes:
        - name: " node-A "
          tendermintURL: http://node-a.example.com:26657
"#;
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = NodeConfig::from_yaml_str(yaml).unwrap();
        config.store.dir = Some(tmp.path().to_path_buf());

        config.build_registries().await.unwrap();
        let registries = config.build_registries().await.unwrap();

        let terra = registries.get(ChainFamily::Terra).unwrap();
        assert_eq!(terra.node_count().await.unwrap(), 1);
        let node = terra.get_node("terra-X", "node-A").await.unwrap();
        assert_eq!(node["name"], "node-A");
    }
}
