use tracing::debug;

use crate::storage::{IndexMeta, StoreCursor};

use super::options::PagingOptions;
use super::query::RangeQuery;
use super::token::PageToken;

/// How a page is fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Step a cursor entry by entry.
    Cursor,
    /// One bulk range read, resumed by key.
    Bulk,
}

impl Strategy {
    /// Picks the retrieval path for `query` before any storage is touched.
    ///
    /// `primary` is the metadata of the table's primary-key index; it matters
    /// when a bulk page would need a primary key the records do not carry.
    pub fn select<C: StoreCursor>(
        query: &RangeQuery<C>,
        index: &IndexMeta<C::Key, C::Record>,
        primary: &IndexMeta<C::Key, C::Record>,
        options: &PagingOptions,
    ) -> Self {
        match cursor_reason(query, index, primary, options) {
            Some(reason) => {
                debug!(
                    table = %query.table,
                    index = %query.index,
                    limit = query.limit,
                    reason,
                    "paging.strategy.cursor"
                );
                Strategy::Cursor
            }
            None => {
                debug!(
                    table = %query.table,
                    index = %query.index,
                    limit = query.limit,
                    "paging.strategy.bulk"
                );
                Strategy::Bulk
            }
        }
    }
}

fn cursor_reason<C: StoreCursor>(
    query: &RangeQuery<C>,
    index: &IndexMeta<C::Key, C::Record>,
    primary: &IndexMeta<C::Key, C::Record>,
    options: &PagingOptions,
) -> Option<&'static str> {
    if options.force_cursor {
        return Some("forced");
    }
    match query.page_token {
        Some(PageToken::Cursor(_)) => return Some("cursor_token"),
        // Offsets count from the range start, which only a cursor can honour.
        Some(PageToken::Offset(_)) => return Some("offset_token"),
        Some(PageToken::LastKey { .. }) | None => {}
    }
    if query.reverse {
        return Some("reverse");
    }
    if query.unique {
        return Some("unique");
    }
    if index.key_length == 0 {
        return Some("outbound_key");
    }
    let secondary = !index.is_primary;
    if secondary && !index.unique && query.values && primary.key_length == 0 {
        return Some("outbound_tiebreak");
    }
    if secondary && !query.values && query.limit < options.small_page_limit {
        return Some("small_key_page");
    }
    None
}
