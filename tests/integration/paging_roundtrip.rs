#![allow(missing_docs)]

mod support;

use std::ops::Bound;

use proptest::prelude::*;
use rangepage::paging::{Paged, PagingOptions};
use rangepage::storage::memory::Key;
use rangepage::storage::ScanRequest;
use rangepage::{KeyRange, RangeStore, PRIMARY_INDEX};

use support::{drain, populated, Query};

#[derive(Clone, Debug)]
struct Shape {
    table: &'static str,
    index: &'static str,
    values: bool,
    unique: bool,
    reverse: bool,
    limit: usize,
    small_page_limit: usize,
    lower: Option<(i64, bool)>,
    upper: Option<(i64, bool)>,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let bound = prop::option::of((0_i64..40, any::<bool>()));
    (
        prop::sample::select(vec!["t", "o"]),
        prop::sample::select(vec![PRIMARY_INDEX, "grp", "code", "tags"]),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        1_usize..12,
        prop::sample::select(vec![1_usize, 10]),
        bound.clone(),
        bound,
    )
        .prop_map(
            |(table, index, values, unique, reverse, limit, small_page_limit, lower, upper)| Shape {
                table,
                index,
                values,
                unique,
                reverse,
                limit,
                small_page_limit,
                lower,
                upper,
            },
        )
}

fn rows_strategy() -> impl Strategy<Value = Vec<(i64, Vec<i64>)>> {
    prop::collection::vec((0_i64..5, prop::collection::vec(0_i64..6, 0..4)), 0..40)
}

fn to_bound(bound: Option<(i64, bool)>) -> Bound<Key> {
    match bound {
        None => Bound::Unbounded,
        Some((key, true)) => Bound::Excluded(Key::Int(key)),
        Some((key, false)) => Bound::Included(Key::Int(key)),
    }
}

impl Shape {
    fn range(&self) -> KeyRange<Key> {
        // `code` keys are strings; integer bounds would cover all or nothing.
        if self.index == "code" {
            return KeyRange::all();
        }
        KeyRange::new(to_bound(self.lower), to_bound(self.upper))
    }

    fn query(&self) -> Query {
        Query::new(self.table, self.index, self.range(), self.limit)
            .values(self.values)
            .unique(self.unique)
            .reverse(self.reverse)
    }

    fn full_scan(&self) -> ScanRequest<Key> {
        ScanRequest {
            table: self.table.into(),
            index: self.index.into(),
            range: self.range(),
            limit: None,
            values: self.values,
            unique: self.unique,
            reverse: self.reverse,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]
    #[test]
    fn concatenated_pages_match_one_unbounded_scan(
        rows in rows_strategy(),
        shape in shape_strategy(),
    ) {
        let groups: Vec<i64> = rows.iter().map(|(grp, _)| *grp).collect();
        let tags: Vec<Vec<i64>> = rows.into_iter().map(|(_, tags)| tags).collect();
        let store = populated(&groups, &tags).expect("populate");
        let paged = Paged::with_options(
            store,
            PagingOptions::default().small_page_limit(shape.small_page_limit),
        );

        let expected = paged.get_all(&shape.full_scan()).expect("full scan");
        let (pages, calls) = drain(&paged, || shape.query()).expect("paged scan");
        prop_assert_eq!(&pages, &expected);
        // Each call but the last returns a token; partial pages may add a few.
        prop_assert!(calls <= 2 * (expected.len() / shape.limit + 1) + 1, "{} calls", calls);
    }
}

#[test]
fn every_flag_combination_round_trips_on_a_fixed_dataset() {
    let groups: Vec<i64> = (0..37).map(|i| (i * 7) % 5).collect();
    let tags: Vec<Vec<i64>> = (0..37).map(|i| vec![i % 4, (i * 3) % 6]).collect();
    for small_page_limit in [1, 10] {
        let paged = Paged::with_options(
            populated(&groups, &tags).expect("populate"),
            PagingOptions::default().small_page_limit(small_page_limit),
        );
        for table in ["t", "o"] {
            for index in [PRIMARY_INDEX, "grp", "code", "tags"] {
                for values in [false, true] {
                    for unique in [false, true] {
                        for reverse in [false, true] {
                            for limit in [1, 2, 5, 10, 36, 37, 50] {
                                let shape = Shape {
                                    table,
                                    index,
                                    values,
                                    unique,
                                    reverse,
                                    limit,
                                    small_page_limit,
                                    lower: None,
                                    upper: None,
                                };
                                let expected = paged.get_all(&shape.full_scan()).expect("scan");
                                let (pages, _) =
                                    drain(&paged, || shape.query()).expect("paged scan");
                                assert_eq!(pages, expected, "{shape:?}");
                            }
                        }
                    }
                }
            }
        }
    }
}
