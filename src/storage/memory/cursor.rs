use std::ops::Bound;
use std::sync::Arc;

use crate::storage::{bounds_are_empty, CursorEntry, KeyRange, ScanRequest, StoreCursor};
use crate::types::{Result, StoreError};

use super::{IndexTree, Key, Record, TableData};

/// Cursor over one index of a [`super::MemoryStore`] table snapshot.
///
/// The cursor remembers the last `(key, primary_key)` it yielded and finds the
/// following entry with a range lookup on every step, so it never holds a
/// borrow into the snapshot.
pub struct MemoryCursor {
    table: Arc<TableData>,
    index: String,
    range: KeyRange<Key>,
    values: bool,
    unique: bool,
    reverse: bool,
    position: Option<(Key, Key)>,
    done: bool,
}

impl MemoryCursor {
    pub(crate) fn new(table: Arc<TableData>, request: &ScanRequest<Key>) -> Self {
        Self {
            table,
            index: request.index.clone(),
            range: request.range.clone(),
            values: request.values,
            unique: request.unique,
            reverse: request.reverse,
            position: None,
            done: false,
        }
    }

    /// Returns `true` when no further entry will be yielded.
    pub(crate) fn is_exhausted(&self) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        Ok(self.following()?.is_none())
    }

    fn tree(&self) -> Result<&IndexTree> {
        self.table.tree(&self.index)
    }

    fn following(&self) -> Result<Option<(Key, Key)>> {
        let tree = self.tree()?;
        let Some((key, primary_key)) = &self.position else {
            return Ok(self.first_in(tree, self.range.as_bounds()));
        };
        if !self.unique && self.range.contains(key) {
            if let Some(owners) = tree.get(key) {
                let sibling = if self.reverse {
                    owners
                        .range::<Key, _>((Bound::Unbounded, Bound::Excluded(primary_key)))
                        .next_back()
                } else {
                    owners
                        .range::<Key, _>((Bound::Excluded(primary_key), Bound::Unbounded))
                        .next()
                };
                if let Some(next) = sibling {
                    return Ok(Some((key.clone(), next.clone())));
                }
            }
        }
        let bounds = if self.reverse {
            (self.range.lower.as_ref(), Bound::Excluded(key))
        } else {
            (Bound::Excluded(key), self.range.upper.as_ref())
        };
        Ok(self.first_in(tree, bounds))
    }

    fn first_in(&self, tree: &IndexTree, bounds: (Bound<&Key>, Bound<&Key>)) -> Option<(Key, Key)> {
        if bounds_are_empty(bounds.0, bounds.1) {
            return None;
        }
        let mut groups = tree.range::<Key, _>(bounds);
        let (key, owners) = if self.reverse {
            groups.next_back()?
        } else {
            groups.next()?
        };
        // Reverse-unique scans still report the lowest primary key of a group.
        let primary_key = if self.reverse && !self.unique {
            owners.last()?
        } else {
            owners.first()?
        };
        Some((key.clone(), primary_key.clone()))
    }

    fn before_start(&self, key: &Key) -> bool {
        let leading = if self.reverse {
            &self.range.upper
        } else {
            &self.range.lower
        };
        match leading {
            Bound::Unbounded => false,
            Bound::Included(edge) if self.reverse => key > edge,
            Bound::Excluded(edge) if self.reverse => key >= edge,
            Bound::Included(edge) => key < edge,
            Bound::Excluded(edge) => key <= edge,
        }
    }
}

impl StoreCursor for MemoryCursor {
    type Key = Key;
    type Record = Record;

    fn next_entry(&mut self) -> Result<Option<CursorEntry<Key, Record>>> {
        if self.done {
            return Ok(None);
        }
        let Some((key, primary_key)) = self.following()? else {
            self.done = true;
            return Ok(None);
        };
        let value = if self.values {
            let record = self
                .table
                .row(&primary_key)
                .ok_or(StoreError::Corruption("index entry without a row"))?;
            Some(record.clone())
        } else {
            None
        };
        self.position = Some((key.clone(), primary_key.clone()));
        Ok(Some(CursorEntry {
            key,
            primary_key,
            value,
        }))
    }

    fn seek_past(&mut self, key: &Key, primary_key: &Key) -> Result<()> {
        if self.before_start(key) {
            self.position = None;
            self.done = false;
        } else if self.range.contains(key) {
            self.position = Some((key.clone(), primary_key.clone()));
            self.done = false;
        } else {
            self.done = true;
        }
        Ok(())
    }
}
