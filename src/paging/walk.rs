use tracing::debug;

use crate::storage::{Items, RangeStore, StoreCursor};
use crate::types::Result;

use super::query::{QueryResponse, RangeQuery};
use super::resolve::resolve_cursor;
use super::token::PageToken;

/// Upper bound on result capacity reserved ahead of stepping.
pub(crate) const PREALLOC_ITEMS: usize = 1024;

/// Collects up to `query.limit` entries by stepping a cursor.
///
/// Reaching the limit parks the cursor, positioned on the next unread entry,
/// in a cursor token. Running out of entries ends pagination without a token.
pub(crate) fn walk_cursor<S: RangeStore>(
    store: &S,
    mut query: RangeQuery<S::Cursor>,
) -> Result<QueryResponse<S::Cursor>> {
    let token = query.page_token.take();
    let Some(mut cursor) = resolve_cursor(store, &query, token)? else {
        debug!(table = %query.table, index = %query.index, "paging.cursor.empty_range");
        return Ok(QueryResponse::done(Items::empty(query.values)));
    };
    let mut results = Items::with_capacity(query.values, query.limit.min(PREALLOC_ITEMS));
    while results.len() < query.limit {
        match cursor.next_entry()? {
            Some(entry) => results.push_entry(entry)?,
            None => {
                debug!(
                    table = %query.table,
                    index = %query.index,
                    returned = results.len(),
                    "paging.cursor.exhausted"
                );
                return Ok(QueryResponse::done(results));
            }
        }
    }
    debug!(
        table = %query.table,
        index = %query.index,
        limit = query.limit,
        "paging.cursor.limit_reached"
    );
    let page_token = query.want_page_token.then(|| PageToken::Cursor(cursor));
    Ok(QueryResponse {
        results,
        page_token,
        partial: false,
    })
}
