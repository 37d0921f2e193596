#![allow(missing_docs)]

mod support;

use rangepage::paging::{PageToken, Paged, PagingOptions};
use rangepage::storage::memory::{Key, MemoryStore, Record};
use rangepage::storage::{Items, ScanRequest};
use rangepage::{KeyRange, RangeStore, Result, PRIMARY_INDEX};

use support::{drain, int_keys, populated, Query};

fn full_scan(
    paged: &Paged<MemoryStore>,
    table: &str,
    index: &str,
    values: bool,
) -> Result<Items<Key, Record>> {
    paged.get_all(&ScanRequest {
        table: table.into(),
        index: index.into(),
        range: KeyRange::all(),
        limit: None,
        values,
        unique: false,
        reverse: false,
    })
}

fn bulk_friendly(store: MemoryStore) -> Paged<MemoryStore> {
    Paged::with_options(store, PagingOptions::default().small_page_limit(1))
}

#[test]
fn duplicate_runs_straddling_pages_are_neither_skipped_nor_repeated() -> Result<()> {
    let groups = [5, 5, 5, 5, 5, 2, 2, 9, 9, 9, 9, 9, 9, 1, 5, 2];
    let tags = vec![Vec::new(); groups.len()];
    let paged = bulk_friendly(populated(&groups, &tags)?);
    let expected = full_scan(&paged, "t", "grp", false)?;
    for limit in 1..=7 {
        for values in [false, true] {
            let (pages, calls) = drain(&paged, || {
                Query::new("t", "grp", KeyRange::all(), limit).values(values)
            })?;
            assert!(calls > 1);
            if values {
                assert_eq!(pages, full_scan(&paged, "t", "grp", true)?, "limit {limit}");
            } else {
                assert_eq!(pages, expected, "limit {limit}");
            }
        }
    }
    Ok(())
}

#[test]
fn tie_break_resumption_finishes_the_run_then_returns_to_bulk() -> Result<()> {
    let groups = [0, 0, 0, 0, 0, 1, 1];
    let tags = vec![Vec::new(); groups.len()];
    let paged = Paged::new(populated(&groups, &tags)?);
    let query = || Query::new("t", "grp", KeyRange::all(), 3).values(true);
    let ids = |items: &Items<Key, Record>| -> Vec<Key> {
        items
            .values()
            .expect("values requested")
            .iter()
            .filter_map(|record| record.get("id").cloned())
            .collect()
    };

    let first = paged.query_range(query())?;
    assert_eq!(ids(&first.results), vec![Key::Int(1), Key::Int(2), Key::Int(3)]);
    assert!(matches!(
        &first.page_token,
        Some(PageToken::LastKey { last_key: Key::Int(0), last_primary_key: Some(Key::Int(3)) })
    ));

    let second = paged.query_range(query().page_token(first.page_token))?;
    assert_eq!(ids(&second.results), vec![Key::Int(4), Key::Int(5)]);
    assert!(second.partial);
    assert!(matches!(
        &second.page_token,
        Some(PageToken::LastKey { last_key: Key::Int(0), last_primary_key: None })
    ));

    let third = paged.query_range(query().page_token(second.page_token))?;
    assert_eq!(ids(&third.results), vec![Key::Int(6), Key::Int(7)]);
    assert!(third.page_token.is_none());
    assert!(!third.partial);
    Ok(())
}

#[test]
fn key_pages_on_duplicates_look_up_the_indexed_key() -> Result<()> {
    let groups = [3, 3, 3, 3, 4];
    let tags = vec![Vec::new(); groups.len()];
    let paged = bulk_friendly(populated(&groups, &tags)?);
    let first = paged.query_range(Query::new("t", "grp", KeyRange::all(), 2))?;
    assert_eq!(int_keys(&first), vec![1, 2]);
    assert!(matches!(
        &first.page_token,
        Some(PageToken::LastKey { last_key: Key::Int(3), last_primary_key: Some(Key::Int(2)) })
    ));
    Ok(())
}

#[test]
fn multi_entry_pages_resume_by_offset() -> Result<()> {
    let groups = vec![0; 12];
    let tags: Vec<Vec<i64>> = (0..12).map(|i| vec![1, 2 + i % 2, 7]).collect();
    let paged = Paged::new(populated(&groups, &tags)?);
    let expected = full_scan(&paged, "t", "tags", true)?;
    assert_eq!(expected.len(), 36);

    let first = paged.query_range(Query::new("t", "tags", KeyRange::all(), 10).values(true))?;
    assert!(matches!(first.page_token, Some(PageToken::Offset(10))));

    for limit in [1, 4, 10, 11, 35, 36, 40] {
        let (pages, _) = drain(&paged, || {
            Query::new("t", "tags", KeyRange::all(), limit).values(true)
        })?;
        assert_eq!(pages, expected, "limit {limit}");
        let (keys, _) = drain(&paged, || Query::new("t", "tags", KeyRange::all(), limit))?;
        assert_eq!(keys, full_scan(&paged, "t", "tags", false)?, "limit {limit}");
    }
    Ok(())
}

#[test]
fn unique_and_primary_indexes_never_carry_a_tie_break() -> Result<()> {
    let groups: Vec<i64> = (0..40).map(|i| i % 3).collect();
    let tags = vec![Vec::new(); groups.len()];
    let paged = bulk_friendly(populated(&groups, &tags)?);
    for index in [PRIMARY_INDEX, "code"] {
        for values in [false, true] {
            let mut token = None;
            let mut seen = 0;
            loop {
                let query = Query::new("t", index, KeyRange::all(), 6)
                    .values(values)
                    .page_token(token.take());
                let response = paged.query_range(query)?;
                seen += response.results.len();
                match response.page_token {
                    Some(PageToken::LastKey {
                        last_key,
                        last_primary_key,
                    }) => {
                        assert!(last_primary_key.is_none(), "{index:?} values={values}");
                        token = Some(PageToken::last_key(last_key));
                    }
                    Some(other) => panic!("unexpected token {other:?}"),
                    None => break,
                }
            }
            assert_eq!(seen, 40);
        }
    }
    Ok(())
}

#[test]
fn outbound_tables_page_without_losing_ties() -> Result<()> {
    let groups: Vec<i64> = (0..30).map(|i| i % 4).collect();
    let tags: Vec<Vec<i64>> = (0..30).map(|i| vec![i % 2, 5]).collect();
    for options in [
        PagingOptions::default(),
        PagingOptions::default().small_page_limit(1),
    ] {
        let paged = Paged::with_options(populated(&groups, &tags)?, options);
        for index in [PRIMARY_INDEX, "grp", "code", "tags"] {
            for values in [false, true] {
                let expected = full_scan(&paged, "o", index, values)?;
                for limit in [1, 3, 10] {
                    let (pages, _) = drain(&paged, || {
                        Query::new("o", index, KeyRange::all(), limit).values(values)
                    })?;
                    assert_eq!(pages, expected, "{index:?} values={values} limit={limit}");
                }
            }
        }
    }
    Ok(())
}
