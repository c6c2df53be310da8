//! Table Rendering
//!
//! Plain-text tables for node listings, driven by [`TableRenderer`].

use crate::chains::{EvmNode, SolanaNode, TerraNode};
use crate::domain::ports::{ChainFamily, NodeRecord, TableRenderer};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Lay out rows under headers with columns padded to their widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = pad_line(headers, &widths);
    out.push_str(&pad_line(&rule.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
    for row in rows {
        out.push_str(&pad_line(&row.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
    }
    out
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string();
    line.push('\n');
    line
}

/// Render typed records decoded from JSON
pub fn render_typed<T: TableRenderer + DeserializeOwned>(values: &[Value]) -> Result<String> {
    let rows = values
        .iter()
        .map(|value| Ok(serde_json::from_value::<T>(value.clone())?.row()))
        .collect::<Result<Vec<_>>>()?;
    Ok(render_table(&T::headers(), &rows))
}

/// Render node records of the given family
pub fn render_node_records(family: ChainFamily, values: &[Value]) -> Result<String> {
    match family {
        ChainFamily::Evm => render_typed::<NodeRecord<EvmNode>>(values),
        ChainFamily::Terra => render_typed::<NodeRecord<TerraNode>>(values),
        ChainFamily::Solana => render_typed::<NodeRecord<SolanaNode>>(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_columns_align() {
        let table = render_table(
            &["ID", "Name"],
            &[
                vec!["1".into(), "node-A".into()],
                vec!["10".into(), "b".into()],
            ],
        );
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[1], "--  ------");
        assert_eq!(lines[2], "1   node-A");
        assert_eq!(lines[3], "10  b");
    }

    #[test]
    fn test_render_terra_records() {
        let values = vec![json!({
            "id": 1,
            "enabled": true,
            "createdAt": "2024-01-01T00:00:00Z",
            "name": "node-A",
            "terraChainID": "terra-X",
            "tendermintURL": "http://a.example.com:26657/"
        })];

        let table = render_node_records(ChainFamily::Terra, &values).unwrap();
        let header = table.lines().next().unwrap();
        assert!(header.starts_with("ID"));
        assert!(header.ends_with("Enabled"));
        assert!(table.contains("node-A"));
        assert!(table.contains("terra-X"));
    }

    #[test]
    fn test_render_wrong_family_fails() {
        let values = vec![json!({ "id": 1, "enabled": true, "name": "x" })];
        assert_matches!(render_node_records(ChainFamily::Solana, &values), Err(_));
    }
}
