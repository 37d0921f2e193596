use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::storage::{IndexMeta, Items, RangeStore, StoreCursor};
use crate::types::{Result, StoreError};

use super::query::{QueryResponse, RangeQuery};
use super::resolve::resolve_cursor;
use super::token::PageToken;
use super::walk::{walk_cursor, PREALLOC_ITEMS};

/// Serves a page with one bulk range read and encodes where the next page
/// starts.
///
/// A bulk read can only resume past a whole key value, never inside a run of
/// duplicates, so a token carrying a primary-key tie-break is handed to
/// [`drain_duplicate_run`] instead.
pub(crate) fn bulk_scan<S: RangeStore>(
    store: &S,
    mut query: RangeQuery<S::Cursor>,
    index: &IndexMeta<S::Key, S::Record>,
    primary: &IndexMeta<S::Key, S::Record>,
) -> Result<QueryResponse<S::Cursor>> {
    let range = match query.page_token.take() {
        None => query.range.clone(),
        Some(PageToken::LastKey {
            last_key,
            last_primary_key: Some(last_primary_key),
        }) => return drain_duplicate_run(store, query, last_key, last_primary_key),
        Some(PageToken::LastKey {
            last_key,
            last_primary_key: None,
        }) => query
            .range
            .clone()
            .resume_from(last_key, false, query.reverse),
        Some(token) => {
            query.page_token = Some(token);
            return walk_cursor(store, query);
        }
    };
    let request = query.scan_request(range, Some(query.limit));
    let results = store.get_all(&request)?;
    if results.len() < query.limit {
        debug!(
            table = %query.table,
            index = %query.index,
            returned = results.len(),
            "paging.bulk.exhausted"
        );
        return Ok(QueryResponse::done(results));
    }
    if !query.want_page_token {
        return Ok(QueryResponse::done(results));
    }
    let page_token = next_token(store, &query, index, primary, &results)?;
    debug!(
        table = %query.table,
        index = %query.index,
        token = %page_token.kind(),
        "paging.bulk.token"
    );
    Ok(QueryResponse {
        results,
        page_token: Some(page_token),
        partial: false,
    })
}

/// Encodes the resumption point after a full bulk page.
fn next_token<S: RangeStore>(
    store: &S,
    query: &RangeQuery<S::Cursor>,
    index: &IndexMeta<S::Key, S::Record>,
    primary: &IndexMeta<S::Key, S::Record>,
    results: &Items<S::Key, S::Record>,
) -> Result<PageToken<S::Cursor>> {
    // Synthetic duplicate keys, or no key derivable from the record at all.
    if index.multi_entry || (query.values && index.key_length == 0) {
        trace!(offset = query.limit, "paging.bulk.token.offset");
        return Ok(PageToken::Offset(query.limit));
    }
    let needs_tiebreak = !(index.unique || index.is_primary);
    let (last_key, last_primary_key) = match results {
        Items::Values(records) => {
            let record = records
                .last()
                .ok_or(StoreError::Corruption("full page without entries"))?;
            let last_key = index
                .key_of(record)
                .ok_or(StoreError::NotFound("indexed key"))?;
            let last_primary_key = if needs_tiebreak {
                Some(
                    primary
                        .key_of(record)
                        .ok_or(StoreError::NotFound("primary key"))?,
                )
            } else {
                None
            };
            (last_key, last_primary_key)
        }
        Items::Keys(keys) => {
            let primary_key = keys
                .last()
                .cloned()
                .ok_or(StoreError::Corruption("full page without entries"))?;
            if index.is_primary {
                (primary_key, None)
            } else {
                // Only the primary key came back; the indexed key lives in the record.
                let record = store
                    .get(&query.table, std::slice::from_ref(&primary_key))?
                    .into_iter()
                    .next()
                    .flatten()
                    .ok_or(StoreError::NotFound("record"))?;
                let last_key = index
                    .key_of(&record)
                    .ok_or(StoreError::NotFound("indexed key"))?;
                (last_key, needs_tiebreak.then_some(primary_key))
            }
        }
    };
    Ok(PageToken::LastKey {
        last_key,
        last_primary_key,
    })
}

/// Finishes a run of entries sharing `last_key` with a cursor, starting just
/// past `(last_key, last_primary_key)`.
///
/// Stops early with a plain `lastKey` token and `partial` set once the run is
/// exhausted, so the next call can go back to bulk reads.
fn drain_duplicate_run<S: RangeStore>(
    store: &S,
    query: RangeQuery<S::Cursor>,
    last_key: S::Key,
    last_primary_key: S::Key,
) -> Result<QueryResponse<S::Cursor>> {
    let resume = PageToken::LastKey {
        last_key: last_key.clone(),
        last_primary_key: Some(last_primary_key),
    };
    let Some(mut cursor) = resolve_cursor(store, &query, Some(resume))? else {
        return Ok(QueryResponse::done(Items::empty(query.values)));
    };
    let past = if query.reverse {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    let mut results = Items::with_capacity(query.values, query.limit.min(PREALLOC_ITEMS));
    loop {
        let Some(entry) = cursor.next_entry()? else {
            debug!(
                table = %query.table,
                returned = results.len(),
                "paging.fallback.exhausted"
            );
            return Ok(QueryResponse::done(results));
        };
        if store.compare_keys(&entry.key, &last_key)? == past {
            debug!(
                table = %query.table,
                returned = results.len(),
                "paging.fallback.passed"
            );
            let page_token = query
                .want_page_token
                .then(|| PageToken::last_key(last_key));
            return Ok(QueryResponse {
                results,
                partial: page_token.is_some(),
                page_token,
            });
        }
        let primary_key = entry.primary_key.clone();
        results.push_entry(entry)?;
        if results.len() >= query.limit {
            trace!(table = %query.table, "paging.fallback.limit_reached");
            let page_token = query.want_page_token.then(|| PageToken::LastKey {
                last_key,
                last_primary_key: Some(primary_key),
            });
            return Ok(QueryResponse {
                results,
                page_token,
                partial: false,
            });
        }
    }
}
