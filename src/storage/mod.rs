#![forbid(unsafe_code)]

//! Contract between the paging layer and an ordered, indexed store.
//!
//! The paging core only orchestrates these primitives: range scans, cursor
//! steps, point lookups, key comparison and index metadata all belong to the
//! store behind [`RangeStore`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::types::{Result, StoreError};

/// Ordered in-memory reference store.
pub mod memory;
mod range;

pub(crate) use range::bounds_are_empty;
pub use range::KeyRange;

/// Index name that addresses a table's primary-key index.
pub const PRIMARY_INDEX: &str = "";

/// A single range read or cursor open against one index of one table.
#[derive(Clone, Debug)]
pub struct ScanRequest<K> {
    /// Table to read.
    pub table: String,
    /// Index to walk; [`PRIMARY_INDEX`] for the primary key.
    pub index: String,
    /// Bounds over the indexed key.
    pub range: KeyRange<K>,
    /// Maximum number of entries for bulk reads; cursors ignore it.
    pub limit: Option<usize>,
    /// Return full records instead of primary keys.
    pub values: bool,
    /// Yield only the first entry of each run of equal indexed keys.
    pub unique: bool,
    /// Walk in descending key order.
    pub reverse: bool,
}

/// Entry a cursor is positioned on.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorEntry<K, R> {
    /// Indexed key of the entry.
    pub key: K,
    /// Primary key of the record behind the entry.
    pub primary_key: K,
    /// Record, present when the cursor was opened with `values`.
    pub value: Option<R>,
}

/// Results of a read: primary keys or full records, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum Items<K, R> {
    /// Primary keys in scan order.
    Keys(Vec<K>),
    /// Records in scan order.
    Values(Vec<R>),
}

impl<K, R> Items<K, R> {
    /// Empty result shaped for `values`.
    pub fn empty(values: bool) -> Self {
        Self::with_capacity(values, 0)
    }

    /// Empty result shaped for `values` with room for `capacity` items.
    pub fn with_capacity(values: bool, capacity: usize) -> Self {
        if values {
            Items::Values(Vec::with_capacity(capacity))
        } else {
            Items::Keys(Vec::with_capacity(capacity))
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        match self {
            Items::Keys(keys) => keys.len(),
            Items::Values(values) => values.len(),
        }
    }

    /// Returns `true` when nothing was returned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the part of a cursor entry this result collects.
    pub fn push_entry(&mut self, entry: CursorEntry<K, R>) -> Result<()> {
        match self {
            Items::Keys(keys) => keys.push(entry.primary_key),
            Items::Values(values) => values.push(
                entry
                    .value
                    .ok_or(StoreError::Corruption("cursor entry missing record value"))?,
            ),
        }
        Ok(())
    }

    /// Primary keys, if this result holds keys.
    pub fn keys(&self) -> Option<&[K]> {
        match self {
            Items::Keys(keys) => Some(keys),
            Items::Values(_) => None,
        }
    }

    /// Records, if this result holds values.
    pub fn values(&self) -> Option<&[R]> {
        match self {
            Items::Keys(_) => None,
            Items::Values(values) => Some(values),
        }
    }

    /// Appends every item of `other`; mismatched shapes are rejected.
    pub fn extend(&mut self, other: Self) -> Result<()> {
        match (self, other) {
            (Items::Keys(keys), Items::Keys(more)) => keys.extend(more),
            (Items::Values(values), Items::Values(more)) => values.extend(more),
            _ => return Err(StoreError::Invalid("cannot mix keys and values")),
        }
        Ok(())
    }
}

/// Maps a record to the key an index stores for it.
pub type KeyExtractor<K, R> = Arc<dyn Fn(&R) -> Option<K> + Send + Sync>;

/// Shape of one index, as reported by the store.
#[derive(Clone)]
pub struct IndexMeta<K, R> {
    /// Index name; [`PRIMARY_INDEX`] for the primary key.
    pub name: String,
    /// Number of components in the key path; `0` means the primary key lives
    /// outside the record.
    pub key_length: usize,
    /// One record may contribute several entries.
    pub multi_entry: bool,
    /// No two records share an indexed key.
    pub unique: bool,
    /// This is the primary-key index.
    pub is_primary: bool,
    /// Derives the indexed key from a record.
    pub extract_key: KeyExtractor<K, R>,
}

impl<K, R> IndexMeta<K, R> {
    /// Indexed key of `record`, if the record carries one.
    pub fn key_of(&self, record: &R) -> Option<K> {
        (self.extract_key)(record)
    }
}

impl<K, R> fmt::Debug for IndexMeta<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexMeta")
            .field("name", &self.name)
            .field("key_length", &self.key_length)
            .field("multi_entry", &self.multi_entry)
            .field("unique", &self.unique)
            .field("is_primary", &self.is_primary)
            .finish_non_exhaustive()
    }
}

/// Step-at-a-time handle over a range scan.
///
/// Each call to [`StoreCursor::next_entry`] is one cooperative step; a cursor
/// that is dropped or parked in a page token is simply stopped.
pub trait StoreCursor {
    /// Key type of the owning store.
    type Key: Clone + fmt::Debug;
    /// Record type of the owning store.
    type Record: Clone + fmt::Debug;

    /// Yields the next entry, or `None` once the range is exhausted.
    fn next_entry(&mut self) -> Result<Option<CursorEntry<Self::Key, Self::Record>>>;

    /// Repositions the cursor so the next step yields the first entry strictly
    /// after `(key, primary_key)` in iteration order.
    fn seek_past(&mut self, key: &Self::Key, primary_key: &Self::Key) -> Result<()>;
}

/// Ordered, indexed store consumed by the paging layer.
pub trait RangeStore {
    /// Key type for both indexed and primary keys.
    type Key: Clone + fmt::Debug;
    /// Stored record type.
    type Record: Clone + fmt::Debug;
    /// Cursor type handed out by [`RangeStore::open_cursor`].
    type Cursor: StoreCursor<Key = Self::Key, Record = Self::Record>;

    /// Reads up to `request.limit` entries of the range in one call.
    fn get_all(&self, request: &ScanRequest<Self::Key>) -> Result<Items<Self::Key, Self::Record>>;

    /// Opens a cursor at the first entry of the range, or `None` when the
    /// range holds no entries.
    fn open_cursor(&self, request: &ScanRequest<Self::Key>) -> Result<Option<Self::Cursor>>;

    /// Point lookup by primary key.
    fn get(&self, table: &str, keys: &[Self::Key]) -> Result<Vec<Option<Self::Record>>>;

    /// Total order consistent with the store's native key ordering.
    fn compare_keys(&self, a: &Self::Key, b: &Self::Key) -> Result<Ordering>;

    /// Metadata for `index` of `table`.
    fn index(&self, table: &str, index: &str) -> Result<IndexMeta<Self::Key, Self::Record>>;
}

impl<S: RangeStore + ?Sized> RangeStore for Arc<S> {
    type Key = S::Key;
    type Record = S::Record;
    type Cursor = S::Cursor;

    fn get_all(&self, request: &ScanRequest<Self::Key>) -> Result<Items<Self::Key, Self::Record>> {
        (**self).get_all(request)
    }

    fn open_cursor(&self, request: &ScanRequest<Self::Key>) -> Result<Option<Self::Cursor>> {
        (**self).open_cursor(request)
    }

    fn get(&self, table: &str, keys: &[Self::Key]) -> Result<Vec<Option<Self::Record>>> {
        (**self).get(table, keys)
    }

    fn compare_keys(&self, a: &Self::Key, b: &Self::Key) -> Result<Ordering> {
        (**self).compare_keys(a, b)
    }

    fn index(&self, table: &str, index: &str) -> Result<IndexMeta<Self::Key, Self::Record>> {
        (**self).index(table, index)
    }
}
