//! Error types for the OCR node core
//!
//! Provides structured error types for config digestion, the per-chain
//! node registry, storage, and the admin surfaces layered on top.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the node core
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Config Digest Errors
    // =========================================================================
    /// The hash primitive produced output of an unexpected size. No safe
    /// digest exists; the caller must abort the round.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("Endpoint class not registered: {class}")]
    EndpointClassNotFound { class: String },

    #[error("Invalid config digest: {0}")]
    InvalidDigest(String),

    // =========================================================================
    // Node Registry Errors
    // =========================================================================
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid pagination: {0}")]
    InvalidPage(String),

    #[error("Chain not found: {family}/{chain_id}")]
    ChainNotFound { family: String, chain_id: String },

    #[error("Node not found: {chain_id}/{name}")]
    NodeNotFound { chain_id: String, name: String },

    #[error("Unsupported chain family: {0}")]
    UnknownChainFamily(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Node store error: {0}")]
    Storage(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code the admin API reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } | Error::InvalidPage(_) | Error::InvalidDigest(_) => 422,
            Error::ChainNotFound { .. }
            | Error::NodeNotFound { .. }
            | Error::EndpointClassNotFound { .. }
            | Error::UnknownChainFamily(_) => 404,
            Error::JsonParse(_) => 400,
            Error::Timeout(_) => 504,
            Error::Storage(_) => 503,
            _ => 500,
        }
    }

    /// Short machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation_failed",
            Error::InvalidPage(_) => "invalid_page",
            Error::InvalidDigest(_) => "invalid_digest",
            Error::ChainNotFound { .. } => "chain_not_found",
            Error::NodeNotFound { .. } => "node_not_found",
            Error::EndpointClassNotFound { .. } => "endpoint_class_not_found",
            Error::UnknownChainFamily(_) => "unknown_chain_family",
            Error::InternalInvariant(_) => "internal_invariant",
            Error::Storage(_) => "storage_error",
            Error::Timeout(_) => "timeout",
            Error::JsonParse(_) => "bad_request",
            _ => "internal_error",
        }
    }

    /// Check if this error is transient.
    ///
    /// The core never retries; this only informs callers that own a
    /// retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Timeout(_) | Error::Io(_))
    }

    /// Check if this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Result type alias for the node core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("name", "empty").status_code(), 422);
        assert_eq!(Error::InvalidPage("size".into()).status_code(), 422);
        assert_eq!(
            Error::ChainNotFound {
                family: "terra".into(),
                chain_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(Error::InternalInvariant("short hash".into()).status_code(), 500);
    }

    #[test]
    fn test_transient_errors() {
        let transient = Error::Storage("disk full".into());
        assert!(transient.is_transient());
        assert!(!transient.is_client_error());

        let invariant = Error::InternalInvariant("hash size".into());
        assert!(!invariant.is_transient());

        let validation = Error::validation("wsURL", "missing");
        assert!(!validation.is_transient());
        assert!(validation.is_client_error());
    }
}
