#![forbid(unsafe_code)]

//! Resumable paging over a [`RangeStore`].
//!
//! [`Paged`] wraps a store and adds [`Paged::query_range`]: each call returns
//! up to `limit` entries and a [`PageToken`] that continues the scan exactly
//! where it stopped. Pages are served either by stepping a cursor or by a bulk
//! range read; [`Strategy::select`] decides per query. Every other store
//! operation passes straight through.

use std::cmp::Ordering;

use tracing::debug;

use crate::storage::{IndexMeta, Items, RangeStore, ScanRequest, PRIMARY_INDEX};
use crate::types::Result;

mod bulk;
pub mod codec;
mod offset;
mod options;
mod query;
mod resolve;
mod strategy;
mod token;
mod walk;

pub use offset::OffsetCursor;
pub use options::{PagingOptions, DEFAULT_SMALL_PAGE_LIMIT};
pub use query::{QueryResponse, RangeQuery};
pub use strategy::Strategy;
pub use token::{PageToken, TokenKind};

/// Store wrapper that answers paged range queries.
pub struct Paged<S> {
    store: S,
    options: PagingOptions,
}

impl<S: RangeStore> Paged<S> {
    /// Wraps `store` with default options.
    pub fn new(store: S) -> Self {
        Self::with_options(store, PagingOptions::default())
    }

    /// Wraps `store` with explicit options.
    pub fn with_options(store: S, options: PagingOptions) -> Self {
        Self { store, options }
    }

    /// Active options.
    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    /// Wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Strategy `query_range` would use for `query`.
    pub fn plan(&self, query: &RangeQuery<S::Cursor>) -> Result<Strategy> {
        let (index, primary) = self.shape(query)?;
        Ok(Strategy::select(query, &index, &primary, &self.options))
    }

    /// Returns one page of `query`.
    ///
    /// A supplied `page_token` must come from the previous page of the same
    /// query; tokens are single-use and a cursor token is only valid while the
    /// session that opened it lives. Neither is checked here.
    pub fn query_range(&self, query: RangeQuery<S::Cursor>) -> Result<QueryResponse<S::Cursor>> {
        debug!(
            table = %query.table,
            index = %query.index,
            limit = query.limit,
            values = query.values,
            unique = query.unique,
            reverse = query.reverse,
            token = query.page_token.as_ref().map(PageToken::kind).map(TokenKind::as_str),
            "paging.query_range"
        );
        if query.limit == 0 {
            return self.empty_page(query);
        }
        let (index, primary) = self.shape(&query)?;
        match Strategy::select(&query, &index, &primary, &self.options) {
            Strategy::Cursor => walk::walk_cursor(&self.store, query),
            Strategy::Bulk => bulk::bulk_scan(&self.store, query, &index, &primary),
        }
    }

    fn shape(
        &self,
        query: &RangeQuery<S::Cursor>,
    ) -> Result<(IndexMeta<S::Key, S::Record>, IndexMeta<S::Key, S::Record>)> {
        let index = self.store.index(&query.table, &query.index)?;
        let primary = if index.is_primary {
            index.clone()
        } else {
            self.store.index(&query.table, PRIMARY_INDEX)?
        };
        Ok((index, primary))
    }

    /// `limit == 0`: positions a cursor without consuming anything.
    fn empty_page(&self, mut query: RangeQuery<S::Cursor>) -> Result<QueryResponse<S::Cursor>> {
        let results = Items::empty(query.values);
        if !query.want_page_token {
            return Ok(QueryResponse::done(results));
        }
        let token = query.page_token.take();
        // With nothing to open, the inbound position is still exact.
        let fallback = token
            .as_ref()
            .and_then(PageToken::try_clone)
            .unwrap_or(PageToken::Offset(0));
        let page_token = match resolve::resolve_cursor(&self.store, &query, token)? {
            Some(cursor) => PageToken::Cursor(cursor),
            None => fallback,
        };
        Ok(QueryResponse {
            results,
            page_token: Some(page_token),
            partial: false,
        })
    }
}

impl<S: RangeStore> RangeStore for Paged<S> {
    type Key = S::Key;
    type Record = S::Record;
    type Cursor = S::Cursor;

    fn get_all(&self, request: &ScanRequest<S::Key>) -> Result<Items<S::Key, S::Record>> {
        self.store.get_all(request)
    }

    fn open_cursor(&self, request: &ScanRequest<S::Key>) -> Result<Option<S::Cursor>> {
        self.store.open_cursor(request)
    }

    fn get(&self, table: &str, keys: &[S::Key]) -> Result<Vec<Option<S::Record>>> {
        self.store.get(table, keys)
    }

    fn compare_keys(&self, a: &S::Key, b: &S::Key) -> Result<Ordering> {
        self.store.compare_keys(a, b)
    }

    fn index(&self, table: &str, index: &str) -> Result<IndexMeta<S::Key, S::Record>> {
        self.store.index(table, index)
    }
}
