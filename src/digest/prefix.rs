//! Prefix Registry
//!
//! Process-wide table of endpoint class → config digest prefix. The table
//! is assembled once at startup through [`PrefixRegistryBuilder`], which
//! rejects collisions, and is frozen into an immutable [`PrefixRegistry`]
//! that digesters read without locking.

use super::digester::{CustomEndpointDigester, CONFIG_DIGEST_PREFIX_CUSTOM_ENDPOINT};
use super::types::{ConfigDigestPrefix, EndpointIdentity};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Class name of the built-in custom endpoint integration
pub const CUSTOM_ENDPOINT_CLASS: &str = "custom-endpoint";

// =============================================================================
// Builder
// =============================================================================

/// Collects class registrations before the table is frozen
#[derive(Debug, Default)]
pub struct PrefixRegistryBuilder {
    classes: IndexMap<String, ConfigDigestPrefix>,
    owners: HashMap<ConfigDigestPrefix, String>,
}

impl PrefixRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-populated with the built-in classes
    pub fn with_builtin_classes() -> Self {
        let mut builder = Self::new();
        // Cannot collide in an empty table
        let _ = builder.register(CUSTOM_ENDPOINT_CLASS, CONFIG_DIGEST_PREFIX_CUSTOM_ENDPOINT);
        builder
    }

    /// Register a class; both the class name and the prefix must be unused
    pub fn register(
        &mut self,
        class: impl Into<String>,
        prefix: impl Into<ConfigDigestPrefix>,
    ) -> Result<&mut Self> {
        let class = class.into();
        let prefix = prefix.into();

        if class.trim().is_empty() {
            return Err(Error::Configuration(
                "endpoint class name must not be empty".into(),
            ));
        }
        if let Some(existing) = self.classes.get(&class) {
            return Err(Error::Configuration(format!(
                "endpoint class {} already registered with prefix {}",
                class, existing
            )));
        }
        if let Some(owner) = self.owners.get(&prefix) {
            return Err(Error::Configuration(format!(
                "prefix {} for class {} collides with class {}",
                prefix, class, owner
            )));
        }

        debug!(class = %class, prefix = %prefix, "Registered endpoint class");
        self.owners.insert(prefix, class.clone());
        self.classes.insert(class, prefix);
        Ok(self)
    }

    /// Freeze the table
    pub fn build(self) -> Arc<PrefixRegistry> {
        Arc::new(PrefixRegistry {
            classes: self.classes,
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Immutable endpoint class → prefix table
#[derive(Debug)]
pub struct PrefixRegistry {
    classes: IndexMap<String, ConfigDigestPrefix>,
}

impl PrefixRegistry {
    /// Prefix registered for a class
    pub fn prefix(&self, class: &str) -> Option<ConfigDigestPrefix> {
        self.classes.get(class).copied()
    }

    /// Class that owns a prefix
    pub fn class_for(&self, prefix: ConfigDigestPrefix) -> Option<&str> {
        self.classes
            .iter()
            .find(|(_, p)| **p == prefix)
            .map(|(class, _)| class.as_str())
    }

    /// Digester for `identity` under the prefix of `class`
    pub fn digester(&self, class: &str, identity: EndpointIdentity) -> Result<CustomEndpointDigester> {
        let prefix = self
            .prefix(class)
            .ok_or_else(|| Error::EndpointClassNotFound {
                class: class.to_string(),
            })?;
        Ok(CustomEndpointDigester::with_prefix(identity, prefix))
    }

    /// Registered classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ConfigDigestPrefix)> {
        self.classes.iter().map(|(class, prefix)| (class.as_str(), *prefix))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::ContractConfig;
    use crate::domain::ports::OffchainConfigDigester;
    use assert_matches::assert_matches;

    #[test]
    fn test_builtin_custom_endpoint_prefix() {
        let registry = PrefixRegistryBuilder::with_builtin_classes().build();
        assert_eq!(registry.prefix(CUSTOM_ENDPOINT_CLASS), Some(ConfigDigestPrefix(4)));
        assert_eq!(registry.class_for(ConfigDigestPrefix(4)), Some(CUSTOM_ENDPOINT_CLASS));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_prefix_collision_rejected() {
        let mut builder = PrefixRegistryBuilder::with_builtin_classes();
        let result = builder.register("dydx-staging", 4u16);
        assert_matches!(result, Err(Error::Configuration(_)));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut builder = PrefixRegistryBuilder::new();
        builder.register("dydx", 0x0100u16).unwrap();
        assert_matches!(builder.register("dydx", 0x0101u16), Err(Error::Configuration(_)));
        assert_matches!(builder.register("  ", 0x0102u16), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_digesters_carry_class_prefix() {
        let mut builder = PrefixRegistryBuilder::with_builtin_classes();
        builder.register("custom-endpoint-staging", 0x0104u16).unwrap();
        let registry = builder.build();

        let identity = EndpointIdentity::new("dydx", "bridge", "ETHUSD");
        let config = ContractConfig::default();
        for (class, prefix) in registry.iter() {
            let digester = registry.digester(class, identity.clone()).unwrap();
            let digest = digester.config_digest(&config).unwrap();
            assert_eq!(digest.prefix(), prefix);
        }

        let prod = registry
            .digester(CUSTOM_ENDPOINT_CLASS, identity.clone())
            .unwrap()
            .config_digest(&config)
            .unwrap();
        let staging = registry
            .digester("custom-endpoint-staging", identity)
            .unwrap()
            .config_digest(&config)
            .unwrap();
        assert_ne!(prod, staging);
    }

    #[test]
    fn test_unknown_class() {
        let registry = PrefixRegistryBuilder::new().build();
        let result = registry.digester("nope", EndpointIdentity::new("a", "b", "c"));
        assert_matches!(result, Err(Error::EndpointClassNotFound { .. }));
    }
}
