#![forbid(unsafe_code)]

//! Support code for the `rangepage` binary: dataset loading, page
//! collection and rendering.

/// Loading JSON datasets into a [`crate::storage::memory::MemoryStore`].
pub mod dataset;

use std::fs;
use std::ops::Bound;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::paging::codec::{decode_token, encode_token};
use crate::paging::{PageToken, Paged, PagingOptions, RangeQuery};
use crate::storage::memory::{Key, MemoryCursor, MemoryStore};
use crate::storage::{Items, KeyRange};
use crate::types::StoreError;

pub use dataset::{dataset_from_str, load_dataset, Dataset, DatasetRow, DatasetTable};

/// Errors raised by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Input JSON was malformed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The store or paging layer rejected the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text shown in place of tokens that have no wire form.
pub const CURSOR_PLACEHOLDER: &str = "<cursor>";

/// Everything needed to rebuild the same query for each page.
#[derive(Clone, Debug)]
pub struct PageRequest {
    /// Table to read.
    pub table: String,
    /// Index to walk.
    pub index: String,
    /// Key bounds.
    pub range: KeyRange<Key>,
    /// Entries per page.
    pub limit: usize,
    /// Return records instead of primary keys.
    pub values: bool,
    /// Suppress duplicate indexed keys.
    pub unique: bool,
    /// Descending order.
    pub reverse: bool,
    /// Stop after this many pages even if more remain.
    pub max_pages: usize,
    /// Encoded token to resume from instead of the range start.
    pub resume: Option<String>,
}

impl PageRequest {
    fn query(&self, token: Option<PageToken<MemoryCursor>>) -> RangeQuery<MemoryCursor> {
        RangeQuery::new(&self.table, &self.index, self.range.clone(), self.limit)
            .values(self.values)
            .unique(self.unique)
            .reverse(self.reverse)
            .page_token(token)
    }
}

/// One page as printed by the binary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageReport {
    /// 1-based page number.
    pub page: usize,
    /// Keys or records on this page.
    pub results: Vec<serde_json::Value>,
    /// Encoded token for the next page, if any.
    pub token: Option<String>,
    /// Whether the page stopped at a resumption boundary.
    pub partial: bool,
}

/// Calls `query_range` until the scan ends, returning every page.
pub fn collect_pages(
    paged: &Paged<MemoryStore>,
    request: &PageRequest,
) -> Result<Vec<PageReport>, CliError> {
    let mut reports = Vec::new();
    let mut token = match &request.resume {
        Some(encoded) => Some(decode_token::<MemoryCursor>(encoded)?),
        None => None,
    };
    loop {
        if reports.len() >= request.max_pages {
            warn!(pages = reports.len(), "cli.collect_pages.max_pages_reached");
            break;
        }
        let response = paged.query_range(request.query(token.take()))?;
        let results = match &response.results {
            Items::Keys(keys) => keys
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?,
            Items::Values(records) => records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?,
        };
        let encoded = match &response.page_token {
            None => None,
            Some(PageToken::Cursor(_)) => Some(CURSOR_PLACEHOLDER.to_owned()),
            Some(resumable) => Some(encode_token(resumable)?),
        };
        reports.push(PageReport {
            page: reports.len() + 1,
            results,
            token: encoded,
            partial: response.partial,
        });
        token = response.page_token;
        if token.is_none() || request.limit == 0 {
            break;
        }
    }
    info!(
        table = %request.table,
        index = %request.index,
        pages = reports.len(),
        "cli.collect_pages.done"
    );
    Ok(reports)
}

/// Renders one page as a single text line.
pub fn render_text(report: &PageReport) -> String {
    let items = report
        .results
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = format!("page {}: [{items}]", report.page);
    if report.partial {
        line.push_str(" (partial)");
    }
    if let Some(token) = &report.token {
        line.push_str(" next=");
        line.push_str(token);
    }
    line
}

/// Parses a key given on the command line: JSON when it parses, otherwise
/// the raw text.
pub fn parse_key(raw: &str) -> Key {
    serde_json::from_str(raw).unwrap_or_else(|_| Key::Text(raw.to_owned()))
}

/// Builds a bound from an optional key and an open/closed flag.
pub fn bound(raw: Option<&str>, open: bool) -> Bound<Key> {
    match raw {
        None => Bound::Unbounded,
        Some(raw) if open => Bound::Excluded(parse_key(raw)),
        Some(raw) => Bound::Included(parse_key(raw)),
    }
}

/// Reads paging options from a TOML file, or defaults when no path is given.
pub fn load_options(path: Option<&Path>) -> Result<PagingOptions, CliError> {
    match path {
        None => Ok(PagingOptions::default()),
        Some(path) => Ok(PagingOptions::from_toml_str(&fs::read_to_string(path)?)?),
    }
}
