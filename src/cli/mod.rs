//! Command Line Interface
//!
//! `serve` runs the node; `nodes <family> list` talks to a running node's
//! admin API and renders its node tables.

pub mod client;
pub mod table;

pub use client::{ListOptions, NodeClient};
pub use table::{render_node_records, render_table};

use crate::domain::ports::ChainFamily;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Commands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the node and its admin API
    Serve(ServeArgs),

    /// Commands for handling RPC node configuration
    Nodes {
        /// Chain family: evm, terra or solana
        family: ChainFamily,

        #[command(subcommand)]
        action: NodesAction,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(long, short, env = "OCR_NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// REST API bind address, overrides the config file
    #[arg(long, env = "API_ADDR")]
    pub api_addr: Option<String>,

    /// Node store directory, overrides the config file
    #[arg(long, env = "STORE_DIR")]
    pub store_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NodesAction {
    /// List existing nodes of a chain
    List {
        /// Chain id
        #[arg(long)]
        chain: String,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<u64>,

        /// Page size
        #[arg(long)]
        size: Option<u64>,

        /// Follow pagination to the last page
        #[arg(long)]
        all: bool,

        /// Admin API base URL
        #[arg(long, env = "OCR_NODE_URL", default_value = "http://localhost:6688")]
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

/// Run a `nodes` subcommand, writing to stdout
pub async fn run_nodes(family: ChainFamily, action: NodesAction) -> anyhow::Result<()> {
    match action {
        NodesAction::List {
            chain,
            page,
            size,
            all,
            url,
            timeout_secs,
        } => {
            let client = NodeClient::new(&url, Duration::from_secs(timeout_secs))?;
            let options = ListOptions {
                chain_id: chain,
                page,
                size,
                all,
            };
            let mut stdout = std::io::stdout();
            client.index_nodes(family, &options, &mut stdout).await?;
            Ok(())
        }
    }
}
