#![allow(dead_code)]

use rangepage::paging::{Paged, QueryResponse, RangeQuery};
use rangepage::storage::memory::{IndexSchema, Key, MemoryCursor, MemoryStore, Record, TableSchema};
use rangepage::storage::Items;
use rangepage::Result;

pub type Query = RangeQuery<MemoryCursor>;
pub type Response = QueryResponse<MemoryCursor>;

/// Upper bound on calls made while draining, so a looping token fails the
/// test instead of hanging it.
pub const MAX_CALLS: usize = 10_000;

/// Table `t` keyed by `id`, with a non-unique `grp`, a unique `code` and a
/// multi-entry `tags` index.
pub fn inbound_table() -> TableSchema {
    TableSchema::inbound("t", "id")
        .index(IndexSchema::new("grp", "grp"))
        .index(IndexSchema::new("code", "code").unique())
        .index(IndexSchema::new("tags", "tags").multi_entry())
}

/// Same indexes as [`inbound_table`] on table `o`, whose keys live outside
/// the record.
pub fn outbound_table() -> TableSchema {
    TableSchema::outbound("o")
        .index(IndexSchema::new("grp", "grp"))
        .index(IndexSchema::new("code", "code").unique())
        .index(IndexSchema::new("tags", "tags").multi_entry())
}

/// Record with the fields every fixture index reads.
pub fn row(id: i64, grp: i64, tags: &[i64]) -> Record {
    Record::new()
        .with("id", id)
        .with("grp", grp)
        .with("code", format!("c{id:04}"))
        .with("tags", Key::Array(tags.iter().copied().map(Key::Int).collect()))
}

/// Store with both fixture tables filled from `groups[i]` / `tags[i]` for
/// ids starting at 1.
pub fn populated(groups: &[i64], tags: &[Vec<i64>]) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    store.create_table(inbound_table())?;
    store.create_table(outbound_table())?;
    for (id, (grp, tags)) in (1_i64..).zip(groups.iter().zip(tags)) {
        store.put("t", row(id, *grp, tags))?;
        store.put_with_key("o", Key::Int(id * 7 % 101), row(id, *grp, tags))?;
    }
    Ok(store)
}

/// Primary keys of a keys-only page, as integers.
pub fn int_keys(response: &Response) -> Vec<i64> {
    response
        .results
        .keys()
        .expect("keys requested")
        .iter()
        .map(|key| match key {
            Key::Int(v) => *v,
            other => panic!("unexpected key {other}"),
        })
        .collect()
}

/// Follows page tokens from `make()` until none is returned, concatenating
/// every page.
pub fn drain<F>(paged: &Paged<MemoryStore>, make: F) -> Result<(Items<Key, Record>, usize)>
where
    F: Fn() -> Query,
{
    let first = make();
    let mut all = Items::empty(first.values);
    let mut token = None;
    let mut calls = 0;
    let mut query = first;
    loop {
        calls += 1;
        assert!(calls <= MAX_CALLS, "pagination did not terminate");
        let response = paged.query_range(query.page_token(token.take()))?;
        all.extend(response.results)?;
        match response.page_token {
            Some(next) => token = Some(next),
            None => return Ok((all, calls)),
        }
        query = make();
    }
}
