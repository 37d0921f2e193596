use std::fmt;

use crate::storage::{Items, KeyRange, ScanRequest, StoreCursor};

use super::token::PageToken;

/// Paged range query against one index of one table.
pub struct RangeQuery<C: StoreCursor> {
    /// Table to read.
    pub table: String,
    /// Index to walk; [`crate::storage::PRIMARY_INDEX`] for the primary key.
    pub index: String,
    /// Bounds over the indexed key.
    pub range: KeyRange<C::Key>,
    /// Maximum entries per page.
    pub limit: usize,
    /// Return records instead of primary keys.
    pub values: bool,
    /// Skip entries whose indexed key repeats the previous one.
    pub unique: bool,
    /// Descending key order.
    pub reverse: bool,
    /// Mint a token when more entries may follow.
    pub want_page_token: bool,
    /// Token from the previous page, if resuming.
    pub page_token: Option<PageToken<C>>,
}

impl<C: StoreCursor> RangeQuery<C> {
    /// Query returning primary keys in ascending order, asking for page tokens.
    pub fn new(table: &str, index: &str, range: KeyRange<C::Key>, limit: usize) -> Self {
        Self {
            table: table.to_owned(),
            index: index.to_owned(),
            range,
            limit,
            values: false,
            unique: false,
            reverse: false,
            want_page_token: true,
            page_token: None,
        }
    }

    /// Sets whether records are returned instead of primary keys.
    pub fn values(mut self, values: bool) -> Self {
        self.values = values;
        self
    }

    /// Sets duplicate-key suppression.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets descending order.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Sets whether a page token is wanted.
    pub fn want_page_token(mut self, want: bool) -> Self {
        self.want_page_token = want;
        self
    }

    /// Resumes from `token`.
    pub fn page_token(mut self, token: Option<PageToken<C>>) -> Self {
        self.page_token = token;
        self
    }

    pub(crate) fn scan_request(
        &self,
        range: KeyRange<C::Key>,
        limit: Option<usize>,
    ) -> ScanRequest<C::Key> {
        ScanRequest {
            table: self.table.clone(),
            index: self.index.clone(),
            range,
            limit,
            values: self.values,
            unique: self.unique,
            reverse: self.reverse,
        }
    }
}

impl<C: StoreCursor> fmt::Debug for RangeQuery<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeQuery")
            .field("table", &self.table)
            .field("index", &self.index)
            .field("range", &self.range)
            .field("limit", &self.limit)
            .field("values", &self.values)
            .field("unique", &self.unique)
            .field("reverse", &self.reverse)
            .field("want_page_token", &self.want_page_token)
            .field("page_token", &self.page_token)
            .finish()
    }
}

/// One page of a range query.
pub struct QueryResponse<C: StoreCursor> {
    /// Primary keys or records, in the requested order.
    pub results: Items<C::Key, C::Record>,
    /// Token for the next page; `None` once the range is exhausted.
    pub page_token: Option<PageToken<C>>,
    /// The page stopped at a resumption boundary rather than at `limit`;
    /// continue with `page_token` even though fewer entries came back.
    pub partial: bool,
}

impl<C: StoreCursor> QueryResponse<C> {
    /// Final page: no token follows.
    pub(crate) fn done(results: Items<C::Key, C::Record>) -> Self {
        Self {
            results,
            page_token: None,
            partial: false,
        }
    }

    /// Returns `true` when another call may return more entries.
    pub fn has_more(&self) -> bool {
        self.page_token.is_some()
    }
}

impl<C: StoreCursor> fmt::Debug for QueryResponse<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResponse")
            .field("results", &self.results)
            .field("page_token", &self.page_token)
            .field("partial", &self.partial)
            .finish()
    }
}
