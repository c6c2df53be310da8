//! Pagination
//!
//! Page/size parsing shared by every listing surface, and the `next`/`prev`
//! links returned alongside each page.

use crate::error::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Page size used when the caller does not specify one
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Largest page size accepted
pub const MAX_PAGE_SIZE: u64 = 1000;

// =============================================================================
// Page Request
// =============================================================================

/// A validated 1-based page request
///
/// Only constructed through [`PageRequest::new`] and the parsers, so page
/// and size are always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    page: u64,
    size: u64,
}

/// Unvalidated wire form of [`PageRequest`]
#[derive(Deserialize)]
struct RawPageRequest {
    page: u64,
    size: u64,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = Error;

    fn try_from(raw: RawPageRequest) -> Result<Self> {
        Self::new(raw.page, raw.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build from numeric values, rejecting zero or oversized requests
    pub fn new(page: u64, size: u64) -> Result<Self> {
        if page == 0 {
            return Err(Error::InvalidPage("page must be at least 1".into()));
        }
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(Error::InvalidPage(format!(
                "size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        // Keep offset arithmetic in range
        (page - 1)
            .checked_mul(size)
            .filter(|offset| usize::try_from(*offset).is_ok())
            .ok_or_else(|| Error::InvalidPage(format!("page {} is out of range", page)))?;

        Ok(Self { page, size })
    }

    /// Parse raw query parameters; absent values fall back to defaults
    pub fn parse(page: Option<&str>, size: Option<&str>) -> Result<Self> {
        let page = match page.map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| Error::InvalidPage(format!("invalid page: {}", raw)))?,
        };
        let size = match size.map(str::trim) {
            None | Some("") => DEFAULT_PAGE_SIZE,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| Error::InvalidPage(format!("invalid size: {}", raw)))?,
        };
        Self::new(page, size)
    }

    /// Parse the page request carried by a pagination link
    pub fn from_href(href: &str) -> Result<Self> {
        let base = Url::parse("http://localhost/")
            .map_err(|e| Error::Internal(format!("invalid base URL: {}", e)))?;
        let url = base
            .join(href)
            .map_err(|e| Error::InvalidPage(format!("invalid link {}: {}", href, e)))?;

        let mut page = None;
        let mut size = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "page" => page = Some(value.into_owned()),
                "size" => size = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::parse(page.as_deref(), size.as_deref())
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of items preceding this page
    pub fn offset(&self) -> usize {
        usize::try_from(self.page.saturating_sub(1).saturating_mul(self.size)).unwrap_or(usize::MAX)
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }
}

// =============================================================================
// Links and Pages
// =============================================================================

/// Links to neighbouring pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PaginationLinks {
    /// Links for `request` over a collection of `total` items at `base_path`
    pub fn build(base_path: &str, request: &PageRequest, total: usize) -> Self {
        let href = |page: u64| format!("{}?page={}&size={}", base_path, page, request.size);
        let shown = request.page.saturating_mul(request.size);

        Self {
            next: ((shown as u128) < total as u128).then(|| href(request.page + 1)),
            prev: (request.page > 1).then(|| href(request.page - 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }
}

/// One page of a stable-ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole collection
    pub total: usize,
    pub request: PageRequest,
    pub links: PaginationLinks,
}

impl<T> Page<T> {
    /// Slice a fully materialised, already-ordered collection
    pub fn from_ordered(all: Vec<T>, request: PageRequest, base_path: &str) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        Self {
            items,
            total,
            request,
            links: PaginationLinks::build(base_path, &request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
            links: self.links,
        }
    }

    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            total: self.total,
            request: self.request,
            links: self.links,
        })
    }
}
