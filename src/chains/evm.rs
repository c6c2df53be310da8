//! EVM Nodes
//!
//! EVM-compatible RPC endpoints. A primary node is reached over websocket
//! with an optional HTTP endpoint; a send-only node is HTTP only and is
//! used for transaction broadcast, never for observation.

use super::{validate_name, validate_url, HTTP_SCHEMES, WS_SCHEMES};
use crate::domain::ports::{ChainFamily, ChainNode, TableRenderer};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Creation input for an EVM node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvmNode {
    pub name: String,
    #[serde(default, rename = "wsURL")]
    pub ws_url: Option<String>,
    #[serde(default, rename = "httpURL")]
    pub http_url: Option<String>,
    #[serde(default)]
    pub send_only: bool,
}

/// A validated EVM node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmNode {
    pub name: String,
    #[serde(rename = "evmChainID")]
    pub evm_chain_id: String,
    #[serde(rename = "wsURL")]
    pub ws_url: Option<String>,
    #[serde(rename = "httpURL")]
    pub http_url: Option<String>,
    pub send_only: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ChainNode for EvmNode {
    type Input = NewEvmNode;

    const FAMILY: ChainFamily = ChainFamily::Evm;

    fn from_input(chain_id: &str, input: NewEvmNode) -> Result<Self> {
        let name = validate_name(&input.name)?;
        let ws_url = non_empty(input.ws_url);
        let http_url = non_empty(input.http_url);

        let (ws_url, http_url) = if input.send_only {
            if ws_url.is_some() {
                return Err(Error::validation("wsURL", "must be empty for a send-only node"));
            }
            let http = http_url
                .ok_or_else(|| Error::validation("httpURL", "required for a send-only node"))?;
            (None, Some(validate_url("httpURL", &http, HTTP_SCHEMES)?))
        } else {
            let ws = ws_url
                .ok_or_else(|| Error::validation("wsURL", "required for a primary node"))?;
            let ws = validate_url("wsURL", &ws, WS_SCHEMES)?;
            let http = http_url
                .map(|h| validate_url("httpURL", &h, HTTP_SCHEMES))
                .transpose()?;
            (Some(ws), http)
        };

        Ok(Self {
            name,
            evm_chain_id: chain_id.to_string(),
            ws_url: ws_url.map(String::from),
            http_url: http_url.map(String::from),
            send_only: input.send_only,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.evm_chain_id
    }
}

impl TableRenderer for EvmNode {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Chain ID", "Websocket URL", "HTTP URL", "Send Only"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.evm_chain_id.clone(),
            self.ws_url.clone().unwrap_or_default(),
            self.http_url.clone().unwrap_or_default(),
            self.send_only.to_string(),
        ]
    }
}
