//! OCR Node
//!
//! Runs the node core (config digests, per-chain RPC node registries and
//! the admin API) or acts as a client of a running node.

use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ocr_node::cli::{run_nodes, Command, ServeArgs};
use ocr_node::{
    ApiServer, ApiServerConfig, ContractConfig, NodeConfig, OffchainConfigDigester, RegistryEvent,
    Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// OCR Node - config digest binding and per-chain RPC node registry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    match args.command {
        Command::Serve(serve_args) => serve(serve_args).await?,
        Command::Nodes { family, action } => run_nodes(family, action).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(addr) = args.api_addr {
        config.api.addr = addr;
    }
    if let Some(dir) = args.store_dir {
        config.store.dir = Some(dir);
    }

    info!("Starting OCR node");
    info!("  Version: {}", ocr_node::VERSION);
    info!("  REST API: {}", config.api.addr);
    match &config.store.dir {
        Some(dir) => info!("  Node store: {}", dir.display()),
        None => info!("  Node store: memory"),
    }

    // Digest prefixes are frozen before any digester exists
    let prefixes = config.prefix_registry()?;
    for (class, prefix) in prefixes.iter() {
        info!(class, prefix = %prefix, "Endpoint class");
    }
    for (class, digester) in config.digesters(&prefixes)? {
        let digest = digester.config_digest(&ContractConfig::default())?;
        info!(class = %class, endpoint = %digester.identity(), digest = %digest, "Bound protocol endpoint");
    }

    let registries = config.build_registries().await?;
    for (family, registry) in registries.iter() {
        info!(
            family = %family,
            chains = registry.chain_ids().len(),
            nodes = registry.node_count().await?,
            "Node registry ready"
        );
    }

    let api_config = ApiServerConfig::from_settings(&config.api.addr, config.api.request_timeout_secs)?;
    let api_server = ApiServer::new(api_config, registries.clone(), prefixes);
    let shutdown = api_server.shutdown_token();

    tokio::spawn(log_events(registries.evm().subscribe(), shutdown.clone()));
    tokio::spawn(log_events(registries.terra().subscribe(), shutdown.clone()));
    tokio::spawn(log_events(registries.solana().subscribe(), shutdown.clone()));

    api_server.shutdown_on(tokio::signal::ctrl_c());

    api_server.run().await?;

    info!("Node shutdown complete");
    Ok(())
}

// =============================================================================
// Registry Events
// =============================================================================

async fn log_events(mut events: broadcast::Receiver<RegistryEvent>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => info!(
                    family = %event.family(),
                    chain_id = event.chain_id(),
                    endpoint_set_changed = event.changes_endpoint_set(),
                    "Registry event: {:?}", event
                ),
                Err(RecvError::Lagged(skipped)) => warn!("Registry event logger lagged, skipped {}", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "tower=warn", "tower_http=info", "axum=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
