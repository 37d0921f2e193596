use std::fmt;

use crate::storage::StoreCursor;

use super::offset::OffsetCursor;

/// Where the next page of a range query resumes.
///
/// Exactly one variant is active. A token is minted per response and consumed
/// by the next call; a [`PageToken::Cursor`] owns a live cursor and can only be
/// used once, within the session that opened it.
pub enum PageToken<C: StoreCursor> {
    /// Live cursor positioned on the next entry to read.
    Cursor(OffsetCursor<C>),
    /// Number of entries to skip from the start of the original range.
    Offset(usize),
    /// Last indexed key returned, with the primary key that breaks ties among
    /// records sharing it.
    LastKey {
        /// Indexed key of the last entry returned.
        last_key: C::Key,
        /// Primary key of the last entry returned, when `last_key` alone is
        /// ambiguous.
        last_primary_key: Option<C::Key>,
    },
}

/// Discriminant of a [`PageToken`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// [`PageToken::Cursor`]
    Cursor,
    /// [`PageToken::Offset`]
    Offset,
    /// [`PageToken::LastKey`]
    LastKey,
}

impl TokenKind {
    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Cursor => "cursor",
            TokenKind::Offset => "offset",
            TokenKind::LastKey => "last_key",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<C: StoreCursor> PageToken<C> {
    /// `lastKey` token without a tie-break.
    pub fn last_key(last_key: C::Key) -> Self {
        PageToken::LastKey {
            last_key,
            last_primary_key: None,
        }
    }

    /// Discriminant of this token.
    pub fn kind(&self) -> TokenKind {
        match self {
            PageToken::Cursor(_) => TokenKind::Cursor,
            PageToken::Offset(_) => TokenKind::Offset,
            PageToken::LastKey { .. } => TokenKind::LastKey,
        }
    }

    /// Copy of a resumable token; `None` for cursor tokens, which cannot be
    /// duplicated.
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            PageToken::Cursor(_) => None,
            PageToken::Offset(skip) => Some(PageToken::Offset(*skip)),
            PageToken::LastKey {
                last_key,
                last_primary_key,
            } => Some(PageToken::LastKey {
                last_key: last_key.clone(),
                last_primary_key: last_primary_key.clone(),
            }),
        }
    }
}

impl<C: StoreCursor> fmt::Debug for PageToken<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Cursor(cursor) => f
                .debug_struct("Cursor")
                .field("pending_skip", &cursor.pending_skip())
                .finish_non_exhaustive(),
            PageToken::Offset(skip) => f.debug_tuple("Offset").field(skip).finish(),
            PageToken::LastKey {
                last_key,
                last_primary_key,
            } => f
                .debug_struct("LastKey")
                .field("last_key", last_key)
                .field("last_primary_key", last_primary_key)
                .finish(),
        }
    }
}
