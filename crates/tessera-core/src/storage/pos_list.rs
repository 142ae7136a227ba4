//! Position lists: ordered row-identifier sequences describing filtered
//! views without copying data.
//!
//! Two shapes exist. [`SingleChunkPosList`] pins every row to one chunk
//! and stores either a `[begin, end)` cursor pair over a sorted index or
//! an explicit offset sequence — this is the shape scan operators
//! produce, and the shape reference-segment iteration fast-paths on.
//! [`RowIdPosList`] stores arbitrary `(chunk, offset)` pairs, possibly
//! including null markers.
//!
//! Consumers branch on [`PosList::references_single_chunk`] once per
//! pass, never per element.

use std::sync::Arc;

use tessera_common::types::{ChunkId, ChunkOffset, RowId};

use super::index::OrderedIndex;

/// An ordered sequence of row identifiers.
#[derive(Debug)]
pub enum PosList {
    /// All rows share one chunk.
    SingleChunk(SingleChunkPosList),
    /// Rows may span arbitrary chunks and include null markers.
    Rows(RowIdPosList),
}

impl PosList {
    /// Number of row identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::SingleChunk(p) => p.len(),
            Self::Rows(p) => p.len(),
        }
    }

    /// Returns `true` if the list holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every row identifier shares a single chunk.
    ///
    /// This is the once-per-pass optimization hint. The generic shape
    /// always answers `false` — even when its chunk ids happen to
    /// coincide, consumers must not assume otherwise.
    #[must_use]
    pub fn references_single_chunk(&self) -> bool {
        matches!(self, Self::SingleChunk(_))
    }

    /// The shared chunk id, if this list references a single chunk.
    #[must_use]
    pub fn common_chunk_id(&self) -> Option<ChunkId> {
        match self {
            Self::SingleChunk(p) => Some(p.chunk_id()),
            Self::Rows(_) => None,
        }
    }

    /// The row identifier at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn row_at(&self, index: usize) -> RowId {
        match self {
            Self::SingleChunk(p) => p.row_at(index),
            Self::Rows(p) => p.0[index],
        }
    }

    /// Iterates all row identifiers in order.
    #[must_use]
    pub fn iter(&self) -> PosListIter<'_> {
        match self {
            Self::SingleChunk(p) => PosListIter::Single {
                chunk_id: p.chunk_id,
                offsets: p.offsets(),
            },
            Self::Rows(p) => PosListIter::Rows(p.0.iter()),
        }
    }

    /// Accurate heap footprint, reported for external cost accounting.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                Self::SingleChunk(p) => p.positions.memory_usage(),
                Self::Rows(p) => p.0.capacity() * std::mem::size_of::<RowId>(),
            }
    }
}

/// A position list confined to one chunk.
#[derive(Debug)]
pub struct SingleChunkPosList {
    chunk_id: ChunkId,
    positions: Positions,
}

#[derive(Debug)]
enum Positions {
    /// A `[start, end)` cursor pair over a sorted index; offsets resolve
    /// through the index at iteration time, no materialization.
    IndexRange {
        index: Arc<OrderedIndex>,
        start: usize,
        end: usize,
    },
    /// Explicit offsets.
    Offsets(Vec<ChunkOffset>),
}

impl Positions {
    fn memory_usage(&self) -> usize {
        match self {
            // The index is owned by the chunk; only the cursors count.
            Self::IndexRange { .. } => 0,
            Self::Offsets(offsets) => offsets.capacity() * std::mem::size_of::<ChunkOffset>(),
        }
    }
}

impl SingleChunkPosList {
    /// Creates a list over the index positions `[start, end)`.
    ///
    /// # Panics
    /// Panics unless `start <= end <= index.len()` and the chunk id is
    /// valid.
    #[must_use]
    pub fn from_index_range(
        chunk_id: ChunkId,
        index: Arc<OrderedIndex>,
        start: usize,
        end: usize,
    ) -> Self {
        assert!(chunk_id.is_valid(), "single-chunk position list needs a valid chunk id");
        assert!(
            start <= end && end <= index.len(),
            "index range {start}..{end} out of bounds (index has {} entries)",
            index.len()
        );
        Self {
            chunk_id,
            positions: Positions::IndexRange { index, start, end },
        }
    }

    /// Creates a list from explicit chunk offsets.
    #[must_use]
    pub fn from_offsets(chunk_id: ChunkId, offsets: Vec<ChunkOffset>) -> Self {
        assert!(chunk_id.is_valid(), "single-chunk position list needs a valid chunk id");
        Self {
            chunk_id,
            positions: Positions::Offsets(offsets),
        }
    }

    /// The chunk every row of this list lives in. Fixed for the list's
    /// lifetime.
    #[must_use]
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk_id
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.positions {
            Positions::IndexRange { start, end, .. } => end - start,
            Positions::Offsets(offsets) => offsets.len(),
        }
    }

    /// Returns `true` if the list holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The row identifier at `index`.
    #[must_use]
    pub fn row_at(&self, index: usize) -> RowId {
        RowId::new(self.chunk_id, self.offset_at(index))
    }

    /// The chunk offset at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn offset_at(&self, index: usize) -> ChunkOffset {
        match &self.positions {
            Positions::IndexRange { index: idx, start, end } => {
                assert!(*start + index < *end, "position {index} out of range");
                idx.offset_at(*start + index)
            }
            Positions::Offsets(offsets) => offsets[index],
        }
    }

    /// Iterates the chunk offsets in order.
    #[must_use]
    pub fn offsets(&self) -> OffsetIter<'_> {
        match &self.positions {
            Positions::IndexRange { index, start, end } => OffsetIter::IndexRange {
                index: index.as_ref(),
                pos: *start,
                end: *end,
            },
            Positions::Offsets(offsets) => OffsetIter::Slice(offsets.iter()),
        }
    }
}

/// Iterator over the offsets of a [`SingleChunkPosList`].
#[derive(Debug)]
pub enum OffsetIter<'a> {
    /// Cursor pair walking a sorted index.
    IndexRange {
        /// The index offsets resolve through.
        index: &'a OrderedIndex,
        /// Next index position.
        pos: usize,
        /// One past the last index position.
        end: usize,
    },
    /// Walk over explicit offsets.
    Slice(std::slice::Iter<'a, ChunkOffset>),
}

impl Iterator for OffsetIter<'_> {
    type Item = ChunkOffset;

    fn next(&mut self) -> Option<ChunkOffset> {
        match self {
            Self::IndexRange { index, pos, end } => {
                if pos < end {
                    let offset = index.offset_at(*pos);
                    *pos += 1;
                    Some(offset)
                } else {
                    None
                }
            }
            Self::Slice(iter) => iter.next().copied(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self {
            Self::IndexRange { pos, end, .. } => end - pos,
            Self::Slice(iter) => iter.len(),
        };
        (len, Some(len))
    }
}

impl ExactSizeIterator for OffsetIter<'_> {}

/// A position list of explicit row identifiers across arbitrary chunks.
///
/// Entries may be [`RowId::NULL`] to mark the absence of a value.
#[derive(Debug, Default)]
pub struct RowIdPosList(Vec<RowId>);

impl RowIdPosList {
    /// Creates a list from explicit row identifiers.
    #[must_use]
    pub fn new(rows: Vec<RowId>) -> Self {
        Self(rows)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the list holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The row identifiers as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[RowId] {
        &self.0
    }

    /// Appends a row identifier.
    pub fn push(&mut self, row: RowId) {
        self.0.push(row);
    }
}

impl From<Vec<RowId>> for RowIdPosList {
    fn from(rows: Vec<RowId>) -> Self {
        Self(rows)
    }
}

/// Iterator over any position list's row identifiers.
#[derive(Debug)]
pub enum PosListIter<'a> {
    /// Single-chunk walk; never crosses a chunk boundary.
    Single {
        /// The shared chunk id.
        chunk_id: ChunkId,
        /// The underlying offset iterator.
        offsets: OffsetIter<'a>,
    },
    /// Walk over explicit row ids.
    Rows(std::slice::Iter<'a, RowId>),
}

impl Iterator for PosListIter<'_> {
    type Item = RowId;

    fn next(&mut self) -> Option<RowId> {
        match self {
            Self::Single { chunk_id, offsets } => {
                offsets.next().map(|offset| RowId::new(*chunk_id, offset))
            }
            Self::Rows(iter) => iter.next().copied(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Single { offsets, .. } => offsets.size_hint(),
            Self::Rows(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for PosListIter<'_> {}
