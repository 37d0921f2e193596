#![allow(missing_docs)]

mod support;

use std::sync::Arc;

use rangepage::paging::{PageToken, Paged, PagingOptions, Strategy};
use rangepage::storage::memory::{Key, MemoryStore, Record, TableSchema};
use rangepage::{KeyRange, Result, PRIMARY_INDEX};

use support::{int_keys, populated, Query};

fn numbered(count: i64) -> Result<Paged<MemoryStore>> {
    let store = MemoryStore::new();
    store.create_table(TableSchema::inbound("n", "id"))?;
    for id in 1..=count {
        store.put("n", Record::new().with("id", id))?;
    }
    Ok(Paged::new(store))
}

#[test]
fn primary_key_pages_resume_by_last_key() -> Result<()> {
    let paged = numbered(25)?;
    let range = KeyRange::between(Key::Int(1), Key::Int(25));

    let first = paged.query_range(Query::new("n", PRIMARY_INDEX, range.clone(), 10))?;
    assert_eq!(int_keys(&first), (1..=10).collect::<Vec<_>>());
    assert!(matches!(
        &first.page_token,
        Some(PageToken::LastKey { last_key: Key::Int(10), last_primary_key: None })
    ));

    let second = paged.query_range(
        Query::new("n", PRIMARY_INDEX, range.clone(), 10).page_token(first.page_token),
    )?;
    assert_eq!(int_keys(&second), (11..=20).collect::<Vec<_>>());
    assert!(matches!(
        &second.page_token,
        Some(PageToken::LastKey { last_key: Key::Int(20), last_primary_key: None })
    ));

    let third =
        paged.query_range(Query::new("n", PRIMARY_INDEX, range, 10).page_token(second.page_token))?;
    assert_eq!(int_keys(&third), (21..=25).collect::<Vec<_>>());
    assert!(third.page_token.is_none());
    assert!(!third.partial);
    Ok(())
}

#[test]
fn reverse_always_walks_a_cursor() -> Result<()> {
    let groups: Vec<i64> = (0..30).map(|i| i % 4).collect();
    let tags: Vec<Vec<i64>> = (0..30).map(|i| vec![i % 3, i % 5]).collect();
    let store = Arc::new(populated(&groups, &tags)?);
    for options in [
        PagingOptions::default(),
        PagingOptions::default().small_page_limit(0),
    ] {
        let paged = Paged::with_options(Arc::clone(&store), options);
        for table in ["t", "o"] {
            for index in [PRIMARY_INDEX, "grp", "code", "tags"] {
                for values in [false, true] {
                    for unique in [false, true] {
                        for limit in [1, 10, 100] {
                            let query = Query::new(table, index, KeyRange::all(), limit)
                                .values(values)
                                .unique(unique)
                                .reverse(true);
                            assert_eq!(paged.plan(&query)?, Strategy::Cursor, "{query:?}");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[test]
fn reverse_pages_come_back_descending() -> Result<()> {
    let paged = numbered(25)?;
    let first = paged.query_range(Query::new("n", PRIMARY_INDEX, KeyRange::all(), 10).reverse(true))?;
    assert_eq!(int_keys(&first), (16..=25).rev().collect::<Vec<_>>());
    assert!(matches!(first.page_token, Some(PageToken::Cursor(_))));
    let second = paged.query_range(
        Query::new("n", PRIMARY_INDEX, KeyRange::all(), 10)
            .reverse(true)
            .page_token(first.page_token),
    )?;
    assert_eq!(int_keys(&second), (6..=15).rev().collect::<Vec<_>>());
    Ok(())
}

#[test]
fn zero_limit_never_returns_entries() -> Result<()> {
    let paged = numbered(5)?;
    for want in [true, false] {
        let response = paged
            .query_range(Query::new("n", PRIMARY_INDEX, KeyRange::all(), 0).want_page_token(want))?;
        assert!(response.results.is_empty());
        assert_eq!(response.page_token.is_some(), want);
    }

    // The parked cursor has not consumed anything.
    let parked = paged.query_range(Query::new("n", PRIMARY_INDEX, KeyRange::all(), 0))?;
    let resumed = paged.query_range(
        Query::new("n", PRIMARY_INDEX, KeyRange::all(), 3).page_token(parked.page_token),
    )?;
    assert_eq!(int_keys(&resumed), vec![1, 2, 3]);
    Ok(())
}

#[test]
fn empty_ranges_yield_empty_final_pages() -> Result<()> {
    let paged = numbered(0)?;
    for limit in [1, 10, 50] {
        for reverse in [false, true] {
            for values in [false, true] {
                let query = Query::new("n", PRIMARY_INDEX, KeyRange::all(), limit)
                    .values(values)
                    .reverse(reverse);
                let response = paged.query_range(query)?;
                assert!(response.results.is_empty());
                assert!(response.page_token.is_none());
                assert!(!response.partial);
            }
        }
    }
    Ok(())
}

#[test]
fn inverted_bounds_are_an_empty_range() -> Result<()> {
    let paged = numbered(10)?;
    let range = KeyRange::between(Key::Int(8), Key::Int(3));
    let response = paged.query_range(Query::new("n", PRIMARY_INDEX, range, 4))?;
    assert!(response.results.is_empty());
    assert!(!response.has_more());
    Ok(())
}

#[test]
fn values_pages_return_whole_records() -> Result<()> {
    let paged = numbered(12)?;
    let first = paged.query_range(Query::new("n", PRIMARY_INDEX, KeyRange::all(), 10).values(true))?;
    let records = first.results.values().expect("values requested");
    assert_eq!(records.len(), 10);
    assert_eq!(records[9].get("id"), Some(&Key::Int(10)));
    let rest = paged.query_range(
        Query::new("n", PRIMARY_INDEX, KeyRange::all(), 10)
            .values(true)
            .page_token(first.page_token),
    )?;
    let ids: Vec<_> = rest
        .results
        .values()
        .expect("values requested")
        .iter()
        .filter_map(|record| record.get("id").cloned())
        .collect();
    assert_eq!(ids, vec![Key::Int(11), Key::Int(12)]);
    assert!(rest.page_token.is_none());
    Ok(())
}
