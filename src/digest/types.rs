//! Config digest data model
//!
//! Fixed-layout digest and prefix types, the endpoint identity that a
//! digester is bound to, and the contract config passed into digestion.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Length of a config digest in bytes
pub const CONFIG_DIGEST_LEN: usize = 32;

/// Length of the prefix embedded at the start of a digest
pub const CONFIG_DIGEST_PREFIX_LEN: usize = 2;

// =============================================================================
// Config Digest Prefix
// =============================================================================

/// Two-byte namespace for the digests of one endpoint class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDigestPrefix(pub u16);

impl ConfigDigestPrefix {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Wire encoding (big-endian)
    #[inline]
    pub fn to_be_bytes(self) -> [u8; CONFIG_DIGEST_PREFIX_LEN] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for ConfigDigestPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl From<u16> for ConfigDigestPrefix {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

// =============================================================================
// Config Digest
// =============================================================================

/// 32-byte protocol instance identifier
///
/// Layout: `[prefix (2 bytes, big-endian) | hash bytes 2..32]`. On-chain
/// verifiers recompute this value, so the layout is fixed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConfigDigest(pub [u8; CONFIG_DIGEST_LEN]);

impl ConfigDigest {
    pub fn as_bytes(&self) -> &[u8; CONFIG_DIGEST_LEN] {
        &self.0
    }

    /// Prefix stored in the first two bytes
    pub fn prefix(&self) -> ConfigDigestPrefix {
        ConfigDigestPrefix(u16::from_be_bytes([self.0[0], self.0[1]]))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; CONFIG_DIGEST_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidDigest(format!(
                "expected {} bytes, got {}",
                CONFIG_DIGEST_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl std::fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigDigest({})", self)
    }
}

impl FromStr for ConfigDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| Error::InvalidDigest(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for ConfigDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ConfigDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Endpoint Identity
// =============================================================================

/// Identifies an off-chain delivery integration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointIdentity {
    /// Endpoint class integration, e.g. `dydx`
    pub endpoint_name: String,
    /// Class-specific target, e.g. a bridge name
    pub endpoint_target: String,
    /// Semantic payload, e.g. `ETHUSD`
    pub payload_type: String,
}

impl EndpointIdentity {
    pub fn new(
        endpoint_name: impl Into<String>,
        endpoint_target: impl Into<String>,
        payload_type: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            endpoint_target: endpoint_target.into(),
            payload_type: payload_type.into(),
        }
    }
}

impl std::fmt::Display for EndpointIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.endpoint_name, self.endpoint_target, self.payload_type
        )
    }
}

// =============================================================================
// Contract Config
// =============================================================================

/// Configuration of a running protocol instance
///
/// Verified externally (on-chain); the core treats it as an opaque blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    pub config_digest: ConfigDigest,
    pub config_count: u64,
    /// On-chain public keys of the oracle signers
    pub signers: Vec<Vec<u8>>,
    /// Transmitter accounts
    pub transmitters: Vec<String>,
    /// Maximum number of faulty oracles tolerated
    pub f: u8,
    pub onchain_config: Vec<u8>,
    pub offchain_config_version: u64,
    pub offchain_config: Vec<u8>,
}
