//! Identifier types for chunks, columns, rows and transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a chunk slot within a table.
///
/// Chunk slots are append-only and never reordered, so a `ChunkId` stays
/// valid for the lifetime of its table even after the chunk itself has
/// been physically removed (the slot becomes a tombstone).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct ChunkId(pub u32);

impl ChunkId {
    /// The invalid/null chunk ID, used by null row markers.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new ChunkId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the slot index as a usize.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Checks if this is a valid chunk ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "ChunkId({})", self.0)
        } else {
            write!(f, "ChunkId(INVALID)")
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChunkId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Offset of a row within one chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct ChunkOffset(pub u32);

impl ChunkOffset {
    /// The invalid/null chunk offset, used by null row markers.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new ChunkOffset from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the offset as a usize.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Checks if this is a valid chunk offset.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for ChunkOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkOffset({})", self.0)
    }
}

impl fmt::Display for ChunkOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChunkOffset {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

/// Index of a column within a table's column definitions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct ColumnId(pub u16);

impl ColumnId {
    /// Creates a new ColumnId from a raw u16 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the column index as a usize.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ColumnId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically assigned; `0` means "no owning
/// transaction" in MVCC row metadata.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct TxId(pub u32);

impl TxId {
    /// The invalid/null transaction ID ("row not owned").
    pub const INVALID: Self = Self(0);

    /// Creates a new TxId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Checks if this is a valid transaction ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "TxId({})", self.0)
        } else {
            write!(f, "TxId(INVALID)")
        }
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TxId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A monotonically assigned snapshot marker used for MVCC row visibility.
///
/// A row with begin commit id `B` and end commit id `E` is visible to a
/// snapshot `C` iff `B <= C < E`. [`CommitId::MAX`] is the sentinel for
/// "not yet committed" (begin) or "still visible" (end).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct CommitId(pub u32);

impl CommitId {
    /// Sentinel: the row version is still open at this end.
    pub const MAX: Self = Self(u32::MAX);

    /// Creates a new CommitId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the next commit ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == u32::MAX {
            write!(f, "CommitId(MAX)")
        } else {
            write!(f, "CommitId({})", self.0)
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CommitId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A row identifier: which chunk, and which offset inside it.
///
/// `RowId::NULL` marks the absence of a value inside position lists
/// (e.g. rows produced by outer joins).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId {
    /// The chunk this row lives in.
    pub chunk_id: ChunkId,
    /// The row's offset within that chunk.
    pub offset: ChunkOffset,
}

impl RowId {
    /// The null row marker.
    pub const NULL: Self = Self {
        chunk_id: ChunkId::INVALID,
        offset: ChunkOffset::INVALID,
    };

    /// Creates a row identifier.
    #[inline]
    #[must_use]
    pub const fn new(chunk_id: ChunkId, offset: ChunkOffset) -> Self {
        Self { chunk_id, offset }
    }

    /// Returns `true` if this is the null row marker.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        !self.chunk_id.is_valid()
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "RowId(NULL)")
        } else {
            write!(f, "RowId({}, {})", self.chunk_id, self.offset)
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "({}, {})", self.chunk_id, self.offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_basic() {
        let id = ChunkId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.as_usize(), 42);
        assert!(id.is_valid());
        assert!(!ChunkId::INVALID.is_valid());
    }

    #[test]
    fn test_chunk_id_ordering() {
        assert!(ChunkId::new(1) < ChunkId::new(2));
        assert!(ChunkId::new(2) < ChunkId::INVALID);
    }

    #[test]
    fn test_tx_id_validity() {
        assert!(!TxId::INVALID.is_valid());
        assert!(TxId::new(1).is_valid());
    }

    #[test]
    fn test_commit_id_sentinel() {
        assert_eq!(CommitId::MAX.as_u32(), u32::MAX);
        assert_eq!(CommitId::new(3).next(), CommitId::new(4));
        assert!(CommitId::new(3) < CommitId::MAX);
    }

    #[test]
    fn test_row_id_null() {
        assert!(RowId::NULL.is_null());
        let row = RowId::new(ChunkId::new(0), ChunkOffset::new(7));
        assert!(!row.is_null());
        assert_eq!(row.chunk_id, ChunkId::new(0));
        assert_eq!(row.offset, ChunkOffset::new(7));
    }
}
