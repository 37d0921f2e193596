use crate::storage::{CursorEntry, StoreCursor};
use crate::types::Result;

/// Cursor wrapper that discards a fixed number of entries before its first
/// step.
///
/// The skip runs lazily inside the first [`StoreCursor::next_entry`] call, so
/// wrapping a cursor that is never stepped costs nothing beyond the open. A
/// skip of zero makes the wrapper a plain pass-through.
pub struct OffsetCursor<C> {
    inner: C,
    skip: usize,
}

impl<C> OffsetCursor<C> {
    /// Wraps `inner`, discarding `skip` entries on the first step.
    pub fn new(inner: C, skip: usize) -> Self {
        Self { inner, skip }
    }

    /// Entries still to be discarded before the first step.
    pub fn pending_skip(&self) -> usize {
        self.skip
    }

    /// Unwraps the base cursor, dropping any pending skip.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: StoreCursor> StoreCursor for OffsetCursor<C> {
    type Key = C::Key;
    type Record = C::Record;

    fn next_entry(&mut self) -> Result<Option<CursorEntry<C::Key, C::Record>>> {
        let skip = std::mem::take(&mut self.skip);
        for _ in 0..skip {
            if self.inner.next_entry()?.is_none() {
                return Ok(None);
            }
        }
        self.inner.next_entry()
    }

    fn seek_past(&mut self, key: &C::Key, primary_key: &C::Key) -> Result<()> {
        self.inner.seek_past(key, primary_key)
    }
}
