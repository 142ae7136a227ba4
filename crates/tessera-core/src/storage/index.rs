//! Per-chunk secondary indexes.
//!
//! An index covers one or more columns of a single finalized chunk.
//! [`OrderedIndex`] keeps chunk offsets sorted by key and answers
//! `lower_bound`/`upper_bound` range queries, which is everything the
//! index scan's half-open-interval algebra needs. [`HashIndex`] answers
//! equality probes only.
//!
//! Null rows never enter an index: SQL comparison semantics can never
//! match them, so scans over an index are complete without them.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use tessera_common::collections::{tessera_map, TesseraMap};
use tessera_common::types::{ChunkOffset, ColumnId, Value};

use super::chunk::Chunk;

/// The kind of a secondary index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexKind {
    /// Sorted index supporting range queries.
    Ordered,
    /// Hash index supporting equality probes only.
    Hash,
}

/// A composite index key: one value per covered column.
///
/// Keys compare via the total order of [`Value::total_cmp`]; building
/// an index over mixed-type keys is a programmer error and panics there.
#[derive(Clone, Debug)]
pub struct IndexKey(SmallVec<[Value; 2]>);

impl IndexKey {
    fn new(values: SmallVec<[Value; 2]>) -> Self {
        Self(values)
    }

    fn cmp_values(&self, other: &[Value]) -> Ordering {
        debug_assert_eq!(self.0.len(), other.len(), "index key arity mismatch");
        for (a, b) in self.0.iter().zip(other) {
            match a.total_cmp(b) {
                Ordering::Equal => {}
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_values(&other.0) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            std::mem::discriminant(value).hash(state);
            match value {
                Value::Null => {}
                Value::Int64(i) => i.hash(state),
                // Bit representation keeps hash consistent with eq.
                Value::Float64(f) => f.to_bits().hash(state),
                Value::Bool(b) => b.hash(state),
                Value::Text(s) => s.hash(state),
            }
        }
    }
}

fn gather_keys(chunk: &Chunk, column_ids: &[ColumnId]) -> Vec<(IndexKey, ChunkOffset)> {
    assert!(!column_ids.is_empty(), "an index must cover at least one column");
    let row_count = chunk.size();
    let mut entries = Vec::with_capacity(row_count as usize);

    'rows: for row in 0..row_count {
        let offset = ChunkOffset::new(row);
        let mut key = SmallVec::new();
        for column_id in column_ids {
            let value = chunk.segment(*column_id).value_at(offset);
            if value.is_null() {
                continue 'rows;
            }
            key.push(value);
        }
        entries.push((IndexKey::new(key), offset));
    }
    entries
}

/// A sorted per-chunk index: offsets ordered by key, then by offset.
#[derive(Debug)]
pub struct OrderedIndex {
    keys: Vec<IndexKey>,
    offsets: Vec<ChunkOffset>,
}

impl OrderedIndex {
    /// Builds the index over the given columns of a finalized chunk.
    #[must_use]
    pub fn build(chunk: &Chunk, column_ids: &[ColumnId]) -> Self {
        let mut entries = gather_keys(chunk, column_ids);
        entries.sort_by(|(ka, oa), (kb, ob)| {
            ka.cmp_values(&kb.0).then_with(|| oa.cmp(ob))
        });

        let (keys, offsets) = entries.into_iter().unzip();
        Self { keys, offsets }
    }

    /// Number of indexed rows (null rows are not indexed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no row is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First index position whose key is `>= values`.
    #[must_use]
    pub fn lower_bound(&self, values: &[Value]) -> usize {
        self.keys
            .partition_point(|key| key.cmp_values(values) == Ordering::Less)
    }

    /// First index position whose key is `> values`.
    #[must_use]
    pub fn upper_bound(&self, values: &[Value]) -> usize {
        self.keys
            .partition_point(|key| key.cmp_values(values) != Ordering::Greater)
    }

    /// The chunk offset stored at an index position.
    ///
    /// # Panics
    /// Panics if `position` is out of range.
    #[must_use]
    pub fn offset_at(&self, position: usize) -> ChunkOffset {
        self.offsets[position]
    }

    /// Approximate heap size.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.keys.capacity() * std::mem::size_of::<IndexKey>()
            + self.offsets.capacity() * std::mem::size_of::<ChunkOffset>()
    }
}

/// A hash index: equality probes, no ranges.
#[derive(Debug)]
pub struct HashIndex {
    positions: TesseraMap<IndexKey, Vec<ChunkOffset>>,
}

impl HashIndex {
    /// Builds the index over the given columns of a finalized chunk.
    #[must_use]
    pub fn build(chunk: &Chunk, column_ids: &[ColumnId]) -> Self {
        let mut positions: TesseraMap<IndexKey, Vec<ChunkOffset>> = tessera_map();
        for (key, offset) in gather_keys(chunk, column_ids) {
            positions.entry(key).or_default().push(offset);
        }
        // gather_keys walks rows in order, so per-key offsets ascend.
        Self { positions }
    }

    /// Chunk offsets whose key equals `values`, in ascending order.
    #[must_use]
    pub fn positions_for(&self, values: &[Value]) -> &[ChunkOffset] {
        let key = IndexKey::new(values.iter().cloned().collect());
        self.positions.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.positions.len()
    }

    /// Approximate heap size.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.positions
            .values()
            .map(|v| v.capacity() * std::mem::size_of::<ChunkOffset>())
            .sum::<usize>()
            + self.positions.capacity() * std::mem::size_of::<IndexKey>()
    }
}
