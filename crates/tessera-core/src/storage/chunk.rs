//! Chunks: fixed-capacity horizontal partitions of a table.
//!
//! A chunk owns one segment per column, optional MVCC metadata, and any
//! secondary indexes built over it. Chunks start mutable, accept rows up
//! to their capacity and are then finalized; a finalized chunk's content
//! never changes again (only MVCC visibility fields and attached
//! indexes do), which is what makes it freely shareable across threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tessera_common::mvcc::MvccData;
use tessera_common::types::{ColumnId, Value};

use super::index::{HashIndex, IndexKind, OrderedIndex};
use super::segment::Segment;

/// A handle to one of a chunk's secondary indexes.
#[derive(Clone, Debug)]
pub enum ChunkIndex {
    /// Sorted index supporting range queries.
    Ordered(Arc<OrderedIndex>),
    /// Hash index supporting equality probes.
    Hash(Arc<HashIndex>),
}

impl ChunkIndex {
    /// Returns the kind tag of this index.
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::Ordered(_) => IndexKind::Ordered,
            Self::Hash(_) => IndexKind::Hash,
        }
    }
}

#[derive(Clone, Debug)]
struct ChunkIndexEntry {
    column_ids: Vec<ColumnId>,
    index: ChunkIndex,
}

/// A fixed-capacity horizontal partition: one segment per column.
#[derive(Debug)]
pub struct Chunk {
    segments: Vec<Segment>,
    mvcc: Option<Arc<MvccData>>,
    mutable: AtomicBool,
    indexes: RwLock<Vec<ChunkIndexEntry>>,
}

impl Chunk {
    /// Default target capacity for data-table chunks.
    pub const DEFAULT_SIZE: u32 = 65_535;

    /// Creates a mutable chunk from fully built segments.
    ///
    /// # Panics
    /// Panics if the chunk has no columns or the segments disagree on
    /// their row count.
    #[must_use]
    pub fn new(segments: Vec<Segment>, mvcc: Option<Arc<MvccData>>) -> Self {
        assert!(!segments.is_empty(), "a chunk needs at least one column");
        let len = segments[0].len();
        assert!(
            segments.iter().all(|s| s.len() == len),
            "all segments of a chunk must have equal length"
        );

        Self {
            segments,
            mvcc,
            mutable: AtomicBool::new(true),
            indexes: RwLock::new(Vec::new()),
        }
    }

    /// Number of rows currently in the chunk (derived from segments).
    #[must_use]
    pub fn size(&self) -> u32 {
        self.segments[0].len() as u32
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> u16 {
        self.segments.len() as u16
    }

    /// Returns the segment storing the given column.
    ///
    /// # Panics
    /// Panics if the column id is out of range.
    #[must_use]
    pub fn segment(&self, column_id: ColumnId) -> &Segment {
        assert!(
            column_id.as_usize() < self.segments.len(),
            "{column_id:?} out of range ({} columns)",
            self.segments.len()
        );
        &self.segments[column_id.as_usize()]
    }

    /// All segments, in column order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Appends one row. The caller serializes appends (table append lock)
    /// and guarantees spare capacity.
    ///
    /// # Panics
    /// Panics if the chunk is finalized or the value count is wrong.
    pub fn append_row(&self, values: &[Value]) {
        assert!(self.is_mutable(), "cannot append to a finalized chunk");
        assert_eq!(
            values.len(),
            self.segments.len(),
            "row arity does not match the chunk's column count"
        );
        for (segment, value) in self.segments.iter().zip(values) {
            match segment {
                Segment::Value(s) => s.push_value(value),
                _ => panic!("cannot append rows to an encoded or reference segment"),
            }
        }
    }

    /// Returns whether the chunk still accepts rows.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable.load(Ordering::Acquire)
    }

    /// Makes the chunk immutable. Idempotent-hostile on purpose: a chunk
    /// is finalized exactly once, by the append path that rotates it out.
    ///
    /// # Panics
    /// Panics if the chunk was already finalized.
    pub fn finalize(&self) {
        let was_mutable = self.mutable.swap(false, Ordering::AcqRel);
        assert!(was_mutable, "chunk was already finalized");
    }

    /// The chunk's MVCC metadata, if its table tracks visibility.
    #[must_use]
    pub fn mvcc_data(&self) -> Option<&Arc<MvccData>> {
        self.mvcc.as_ref()
    }

    /// Returns whether this chunk carries MVCC metadata.
    #[must_use]
    pub fn has_mvcc_data(&self) -> bool {
        self.mvcc.is_some()
    }

    /// Number of rows whose deletion has been committed.
    #[must_use]
    pub fn invalid_row_count(&self) -> u32 {
        self.mvcc.as_ref().map_or(0, |m| m.invalid_row_count())
    }

    /// Builds and attaches a secondary index over the given columns.
    ///
    /// # Panics
    /// Panics if the chunk is still mutable — indexes describe a frozen
    /// row set — or if a column id is out of range.
    pub fn create_index(&self, kind: IndexKind, column_ids: &[ColumnId]) -> ChunkIndex {
        assert!(
            !self.is_mutable(),
            "indexes can only be created on finalized chunks"
        );
        let index = match kind {
            IndexKind::Ordered => ChunkIndex::Ordered(Arc::new(OrderedIndex::build(self, column_ids))),
            IndexKind::Hash => ChunkIndex::Hash(Arc::new(HashIndex::build(self, column_ids))),
        };
        self.indexes.write().push(ChunkIndexEntry {
            column_ids: column_ids.to_vec(),
            index: index.clone(),
        });
        index
    }

    /// Looks up an attached index by kind and exact column set.
    #[must_use]
    pub fn get_index(&self, kind: IndexKind, column_ids: &[ColumnId]) -> Option<ChunkIndex> {
        self.indexes
            .read()
            .iter()
            .find(|entry| entry.index.kind() == kind && entry.column_ids == column_ids)
            .map(|entry| entry.index.clone())
    }

    /// Carries another chunk's index entries over to this one.
    ///
    /// Valid only when row offsets are unchanged (e.g. after dictionary
    /// re-encoding of the same rows).
    pub fn adopt_indexes_from(&self, other: &Chunk) {
        let entries = other.indexes.read().clone();
        *self.indexes.write() = entries;
    }

    /// Approximate heap size of segments, MVCC data and indexes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        let segments: usize = self.segments.iter().map(Segment::memory_usage).sum();
        let mvcc = self.mvcc.as_ref().map_or(0, |m| m.memory_usage());
        let indexes: usize = self
            .indexes
            .read()
            .iter()
            .map(|entry| match &entry.index {
                ChunkIndex::Ordered(i) => i.memory_usage(),
                ChunkIndex::Hash(i) => i.memory_usage(),
            })
            .sum();
        segments + mvcc + indexes
    }
}
