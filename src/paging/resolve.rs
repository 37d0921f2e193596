use tracing::trace;

use crate::storage::{RangeStore, StoreCursor};
use crate::types::Result;

use super::offset::OffsetCursor;
use super::query::RangeQuery;
use super::token::PageToken;

/// Turns an inbound token into a cursor ready for its first step.
///
/// `query.page_token` is ignored; the caller hands the token over separately
/// so it can keep the query borrowed. Returns `None` when the (possibly
/// rewritten) range holds no entries.
pub(crate) fn resolve_cursor<S: RangeStore>(
    store: &S,
    query: &RangeQuery<S::Cursor>,
    token: Option<PageToken<S::Cursor>>,
) -> Result<Option<OffsetCursor<S::Cursor>>> {
    match token {
        None => open(store, query, 0),
        Some(PageToken::Cursor(cursor)) => {
            trace!(table = %query.table, "paging.resolve.live_cursor");
            Ok(Some(cursor))
        }
        Some(PageToken::Offset(skip)) => {
            trace!(table = %query.table, skip, "paging.resolve.offset");
            open(store, query, skip)
        }
        Some(PageToken::LastKey {
            last_key,
            last_primary_key,
        }) => {
            // Without a tie-break every entry at `last_key` was already returned.
            let range = query.range.clone().resume_from(
                last_key.clone(),
                last_primary_key.is_some(),
                query.reverse,
            );
            let request = query.scan_request(range, None);
            let Some(mut cursor) = store.open_cursor(&request)? else {
                return Ok(None);
            };
            if let Some(primary_key) = last_primary_key {
                trace!(
                    table = %query.table,
                    last_key = ?last_key,
                    last_primary_key = ?primary_key,
                    "paging.resolve.seek_past"
                );
                cursor.seek_past(&last_key, &primary_key)?;
            }
            Ok(Some(OffsetCursor::new(cursor, 0)))
        }
    }
}

fn open<S: RangeStore>(
    store: &S,
    query: &RangeQuery<S::Cursor>,
    skip: usize,
) -> Result<Option<OffsetCursor<S::Cursor>>> {
    let request = query.scan_request(query.range.clone(), None);
    Ok(store
        .open_cursor(&request)?
        .map(|cursor| OffsetCursor::new(cursor, skip)))
}
