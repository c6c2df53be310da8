//! Terra Nodes

use super::{validate_name, validate_url, HTTP_SCHEMES};
use crate::domain::ports::{ChainFamily, ChainNode, TableRenderer};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Creation input for a Terra node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTerraNode {
    pub name: String,
    #[serde(rename = "tendermintURL")]
    pub tendermint_url: String,
}

/// A validated Terra node backed by a Tendermint RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerraNode {
    pub name: String,
    #[serde(rename = "terraChainID")]
    pub terra_chain_id: String,
    #[serde(rename = "tendermintURL")]
    pub tendermint_url: String,
}

impl ChainNode for TerraNode {
    type Input = NewTerraNode;

    const FAMILY: ChainFamily = ChainFamily::Terra;

    fn from_input(chain_id: &str, input: NewTerraNode) -> Result<Self> {
        let name = validate_name(&input.name)?;
        let url = validate_url("tendermintURL", &input.tendermint_url, HTTP_SCHEMES)?;

        Ok(Self {
            name,
            terra_chain_id: chain_id.to_string(),
            tendermint_url: url.into(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.terra_chain_id
    }
}

impl TableRenderer for TerraNode {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Chain ID", "Tendermint URL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.terra_chain_id.clone(),
            self.tendermint_url.clone(),
        ]
    }
}
