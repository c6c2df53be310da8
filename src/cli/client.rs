//! Admin API Client
//!
//! HTTP client used by the `nodes` commands. Follows the server's
//! pagination links rather than computing offsets itself.

use super::table::render_node_records;
use crate::api::{ApiErrorResponse, ListResponse};
use crate::domain::ports::ChainFamily;
use anyhow::{bail, Context};
use reqwest::Url;
use serde_json::Value;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Options for `nodes <family> list`
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub chain_id: String,
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// Keep following `next` links until the last page
    pub all: bool,
}

/// Client for the node admin API
pub struct NodeClient {
    http: reqwest::Client,
    base: Url,
}

impl NodeClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid API URL {}", base_url))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base })
    }

    fn nodes_url(&self, family: ChainFamily, options: &ListOptions) -> anyhow::Result<Url> {
        let path = format!(
            "/v2/chains/{}/{}/nodes",
            family,
            urlencoding::encode(&options.chain_id)
        );
        let mut url = self.base.join(&path).context("invalid nodes path")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(page) = options.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(size) = options.size {
                query.append_pair("size", &size.to_string());
            }
        }
        Ok(url)
    }

    /// Fetch one page from an absolute URL
    pub async fn get_page(&self, url: Url) -> anyhow::Result<ListResponse<Value>> {
        debug!(url = %url, "Fetching page");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(body) => format!("{} ({})", body.message, body.error),
                Err(_) => status.to_string(),
            };
            bail!("server returned {}: {}", status.as_u16(), message);
        }

        response
            .json()
            .await
            .with_context(|| format!("malformed list response from {}", url))
    }

    /// Fetch the page a pagination link points at
    pub async fn follow(&self, href: &str) -> anyhow::Result<ListResponse<Value>> {
        let url = self
            .base
            .join(href)
            .with_context(|| format!("invalid pagination link {}", href))?;
        self.get_page(url).await
    }

    /// Render a chain's nodes as a table, one or all pages
    pub async fn index_nodes<W: Write>(
        &self,
        family: ChainFamily,
        options: &ListOptions,
        out: &mut W,
    ) -> anyhow::Result<usize> {
        let mut page = self.get_page(self.nodes_url(family, options)?).await?;
        let mut shown = 0;

        loop {
            shown += page.data.len();
            let table = render_node_records(family, &page.data)
                .context("unexpected node record in response")?;
            out.write_all(table.as_bytes())?;

            match page.links.next.take() {
                Some(next) if options.all => page = self.follow(&next).await?,
                Some(next) => {
                    writeln!(out, "\n{} of {} nodes shown; next page: {}", shown, page.meta.count, next)?;
                    break;
                }
                None => break,
            }
        }

        Ok(shown)
    }
}
