//! Admin API Server
//!
//! Serves the REST router until the shutdown token is cancelled.

use super::metrics::ApiMetrics;
use super::rest::RestRouter;
use crate::digest::PrefixRegistry;
use crate::error::{Error, Result};
use crate::registry::NodeRegistries;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tokio::task::JoinHandle;
use tracing::{info, warn};

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub addr: SocketAddr,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 6688)),
            request_timeout_secs: 30,
        }
    }
}

impl ApiServerConfig {
    /// Build from the textual listener settings of the config file
    pub fn from_settings(addr: &str, request_timeout_secs: u64) -> Result<Self> {
        let addr = addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid API address {}: {}", addr, e)))?;
        Ok(Self {
            addr,
            request_timeout_secs,
        })
    }
}

// =============================================================================
// API Server
// =============================================================================

/// Admin REST API server
pub struct ApiServer {
    config: ApiServerConfig,
    registries: NodeRegistries,
    prefixes: Arc<PrefixRegistry>,
    shutdown: CancellationToken,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, registries: NodeRegistries, prefixes: Arc<PrefixRegistry>) -> Self {
        Self {
            config,
            registries,
            prefixes,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Shut down once `signal` fires
    ///
    /// A signal that fails to install leaves the server running.
    pub fn shutdown_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match signal.await {
                Ok(()) => {
                    info!("Received interrupt, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!("Cannot listen for interrupt, serving until stopped: {}", e),
            }
        })
    }

    /// Router with tracing, timeout and CORS layers applied
    pub fn app(&self) -> Result<Router> {
        let metrics = Arc::new(ApiMetrics::new()?);
        let router = RestRouter::new(self.registries.clone(), self.prefixes.clone(), metrics).build();

        Ok(router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(self.config.request_timeout_secs)))
                .layer(CorsLayer::permissive()),
        ))
    }

    /// Bind and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| Error::Internal(format!("Failed to bind REST server: {}", e)))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: tokio::net::TcpListener) -> Result<()> {
        let app = self.app()?;
        let shutdown = self.shutdown.clone();

        info!("REST API listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainRecord;
    use crate::digest::PrefixRegistryBuilder;
    use crate::domain::ports::ChainFamily;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.addr.port(), 6688);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_from_settings() {
        let config = ApiServerConfig::from_settings("127.0.0.1:9000", 5).unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_matches!(ApiServerConfig::from_settings("nope", 5), Err(Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let registries = NodeRegistries::in_memory();
        registries
            .register_chain(ChainRecord::new(ChainFamily::Solana, "devnet"))
            .unwrap();

        let server = Arc::new(ApiServer::new(
            ApiServerConfig::default(),
            registries,
            PrefixRegistryBuilder::with_builtin_classes().build(),
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };

        let url = format!("http://{}/v2/chains/solana", addr);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body["meta"]["count"], 1);
        assert_eq!(body["data"][0]["id"], "devnet");

        server.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failed_signal_keeps_serving() {
        let server = ApiServer::new(
            ApiServerConfig::default(),
            NodeRegistries::in_memory(),
            PrefixRegistryBuilder::with_builtin_classes().build(),
        );
        let token = server.shutdown_token();

        let failed = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal handler")) };
        server.shutdown_on(failed).await.unwrap();
        assert!(!token.is_cancelled());

        server.shutdown_on(async { Ok(()) }).await.unwrap();
        assert!(token.is_cancelled());
    }
}
