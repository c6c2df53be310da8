//! Config Digester
//!
//! Derives the digest that binds a protocol instance to one endpoint
//! integration. The digest depends only on the endpoint identity and the
//! class prefix, so every peer computes the same value independently.

use super::types::{
    ConfigDigest, ConfigDigestPrefix, ContractConfig, EndpointIdentity, CONFIG_DIGEST_LEN,
    CONFIG_DIGEST_PREFIX_LEN,
};
use crate::domain::ports::OffchainConfigDigester;
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};

/// Prefix of the custom-endpoint class
pub const CONFIG_DIGEST_PREFIX_CUSTOM_ENDPOINT: ConfigDigestPrefix = ConfigDigestPrefix(4);

/// Compute the config digest for an endpoint identity
///
/// SHA-256 over `endpoint_name ‖ endpoint_target ‖ payload_type` (no
/// separators), with the first two bytes overwritten by `prefix` in
/// big-endian order.
///
/// `_config` is accepted but not hashed: the digest is unique per endpoint
/// identity and prefix, not per contract config. Config correctness is
/// checked on-chain.
pub fn compute_digest(
    identity: &EndpointIdentity,
    prefix: ConfigDigestPrefix,
    _config: &ContractConfig,
) -> Result<ConfigDigest> {
    let mut hasher = Sha256::new();
    hasher.update(identity.endpoint_name.as_bytes());
    hasher.update(identity.endpoint_target.as_bytes());
    hasher.update(identity.payload_type.as_bytes());
    let raw_hash = hasher.finalize();

    digest_from_hash(&raw_hash, prefix)
}

/// Lay out a raw hash as a digest carrying `prefix`
fn digest_from_hash(raw_hash: &[u8], prefix: ConfigDigestPrefix) -> Result<ConfigDigest> {
    if raw_hash.len() != CONFIG_DIGEST_LEN {
        return Err(Error::InternalInvariant(format!(
            "incorrect hash size {}, expected {}",
            raw_hash.len(),
            CONFIG_DIGEST_LEN
        )));
    }

    let mut digest = [0u8; CONFIG_DIGEST_LEN];
    digest.copy_from_slice(raw_hash);
    digest[..CONFIG_DIGEST_PREFIX_LEN].copy_from_slice(&prefix.to_be_bytes());

    Ok(ConfigDigest(digest))
}

// =============================================================================
// Custom Endpoint Digester
// =============================================================================

/// Digester for custom off-chain endpoint integrations
///
/// Distinct deployments of the same integration (staging vs production)
/// are kept apart by giving them different identities or prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEndpointDigester {
    identity: EndpointIdentity,
    prefix: ConfigDigestPrefix,
}

impl CustomEndpointDigester {
    /// Digester using the built-in custom-endpoint prefix
    pub fn new(identity: EndpointIdentity) -> Self {
        Self::with_prefix(identity, CONFIG_DIGEST_PREFIX_CUSTOM_ENDPOINT)
    }

    /// Digester bound to an explicit class prefix
    pub fn with_prefix(identity: EndpointIdentity, prefix: ConfigDigestPrefix) -> Self {
        Self { identity, prefix }
    }

    pub fn identity(&self) -> &EndpointIdentity {
        &self.identity
    }
}

impl OffchainConfigDigester for CustomEndpointDigester {
    fn config_digest(&self, config: &ContractConfig) -> Result<ConfigDigest> {
        compute_digest(&self.identity, self.prefix, config)
    }

    fn config_digest_prefix(&self) -> ConfigDigestPrefix {
        self.prefix
    }
}
