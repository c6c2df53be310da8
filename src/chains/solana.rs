//! Solana Nodes

use super::{validate_name, validate_url, HTTP_SCHEMES};
use crate::domain::ports::{ChainFamily, ChainNode, TableRenderer};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Creation input for a Solana node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSolanaNode {
    pub name: String,
    #[serde(rename = "solanaURL")]
    pub solana_url: String,
}

/// A validated Solana JSON-RPC node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaNode {
    pub name: String,
    #[serde(rename = "solanaChainID")]
    pub solana_chain_id: String,
    #[serde(rename = "solanaURL")]
    pub solana_url: String,
}

impl ChainNode for SolanaNode {
    type Input = NewSolanaNode;

    const FAMILY: ChainFamily = ChainFamily::Solana;

    fn from_input(chain_id: &str, input: NewSolanaNode) -> Result<Self> {
        let name = validate_name(&input.name)?;
        let url = validate_url("solanaURL", &input.solana_url, HTTP_SCHEMES)?;

        Ok(Self {
            name,
            solana_chain_id: chain_id.to_string(),
            solana_url: url.into(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.solana_chain_id
    }
}

impl TableRenderer for SolanaNode {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Chain ID", "URL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.solana_chain_id.clone(),
            self.solana_url.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solana_node_json_shape() {
        let node = SolanaNode::from_input(
            "mainnet",
            NewSolanaNode {
                name: "sol-1".into(),
                solana_url: "https://api.mainnet-beta.solana.com".into(),
            },
        )
        .unwrap();

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["solanaChainID"], "mainnet");
        assert_eq!(json["solanaURL"], "https://api.mainnet-beta.solana.com/");
    }

    #[test]
    fn test_solana_rejects_missing_url() {
        assert!(SolanaNode::from_input("mainnet", NewSolanaNode {
            name: "sol-1".into(),
            solana_url: "".into(),
        })
        .is_err());
    }
}
