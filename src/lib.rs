//! Resumable paginated range queries over ordered, indexed key-value stores.
//!
//! A caller asks [`paging::Paged::query_range`] for up to `limit` entries of a
//! key range and receives a [`paging::PageToken`] that continues the scan with
//! the same results an uninterrupted walk would produce, across duplicate keys,
//! multi-entry indexes and primary keys kept outside the record.

#![warn(missing_docs)]

pub mod cli;
pub mod paging;
pub mod storage;
pub mod types;

pub use paging::{PageToken, Paged, PagingOptions, QueryResponse, RangeQuery, Strategy};
pub use storage::{KeyRange, RangeStore, StoreCursor, PRIMARY_INDEX};
pub use types::{Result, StoreError};
