use serde::{Deserialize, Serialize};

use crate::types::{Result, StoreError};

/// Pages smaller than this that return only primary keys from a secondary
/// index are served by a cursor walk instead of a bulk read.
pub const DEFAULT_SMALL_PAGE_LIMIT: usize = 10;

/// Tuning knobs for strategy selection.
///
/// None of these affect which entries a query returns, only how they are
/// fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingOptions {
    /// Threshold below which key-only secondary-index pages use a cursor.
    pub small_page_limit: usize,
    /// Serve every query with a cursor walk.
    pub force_cursor: bool,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            small_page_limit: DEFAULT_SMALL_PAGE_LIMIT,
            force_cursor: false,
        }
    }
}

impl PagingOptions {
    /// Sets the small-page threshold.
    pub fn small_page_limit(mut self, limit: usize) -> Self {
        self.small_page_limit = limit;
        self
    }

    /// Disables the bulk-read path when `true`.
    pub fn force_cursor(mut self, force: bool) -> Self {
        self.force_cursor = force;
        self
    }

    /// Parses options from a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|err| StoreError::Serialization(err.to_string()))
    }
}
