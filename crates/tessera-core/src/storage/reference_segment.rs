//! Reference segments: column views through a position list.
//!
//! A reference segment never stores data. It names a base table, a
//! column in it, and a position list describing which rows to expose in
//! which order. Every reference segment built from one scan result
//! shares that scan's position list.
//!
//! Iteration branches once on the position list's shape:
//!
//! - single-chunk lists resolve the referenced chunk's physical segment
//!   exactly once and iterate with nothing but an offset cursor and one
//!   [`SegmentAccessor`](super::segment::SegmentAccessor) — no
//!   per-element chunk lookups;
//! - generic lists walk runs of same-chunk rows, resolving each chunk
//!   lazily on first touch and caching the handle for the pass, which
//!   keeps dereferencing amortized O(1) per element.

use std::fmt;
use std::sync::Arc;

use tessera_common::types::{ChunkId, ColumnId, DataType, Value};

use super::chunk::Chunk;
use super::pos_list::PosList;
use super::segment::SegmentType;
use super::table::{Table, TableKind};

/// A column view defined by a position list into another table.
pub struct ReferenceSegment {
    table: Arc<Table>,
    column_id: ColumnId,
    pos_list: Arc<PosList>,
}

impl ReferenceSegment {
    /// Creates a view of `column_id` in `table` for the rows of `pos_list`.
    ///
    /// # Panics
    /// Panics if the referenced table is not a mutable base (`Data`)
    /// table — chains of reference segments are a configuration error —
    /// or if the column id is out of range.
    #[must_use]
    pub fn new(table: Arc<Table>, column_id: ColumnId, pos_list: Arc<PosList>) -> Self {
        assert!(
            table.kind() == TableKind::Data,
            "reference segments must point at a data table, never at reference segments"
        );
        assert!(
            column_id.as_usize() < table.column_count() as usize,
            "{column_id:?} out of range ({} columns)",
            table.column_count()
        );
        Self {
            table,
            column_id,
            pos_list,
        }
    }

    /// The referenced base table.
    #[must_use]
    pub fn referenced_table(&self) -> &Arc<Table> {
        &self.table
    }

    /// The referenced column.
    #[must_use]
    pub fn referenced_column_id(&self) -> ColumnId {
        self.column_id
    }

    /// The position list defining this view.
    #[must_use]
    pub fn pos_list(&self) -> &Arc<PosList> {
        &self.pos_list
    }

    /// The data type of the referenced column.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.table.column_data_type(self.column_id)
    }

    /// Number of rows exposed by this view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pos_list.len()
    }

    /// Returns `true` if the view exposes no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos_list.is_empty()
    }

    /// Visits every exposed row as a native value (`None` = null).
    ///
    /// The callback receives the row's position within this segment and
    /// its value.
    pub fn for_each_typed<T, F>(&self, mut f: F)
    where
        T: SegmentType,
        F: FnMut(usize, Option<T>),
    {
        match &*self.pos_list {
            PosList::SingleChunk(list) => {
                if list.is_empty() {
                    return;
                }
                let chunk = self.resolve_chunk(list.chunk_id());
                let accessor = T::accessor(chunk.segment(self.column_id));
                for (i, offset) in list.offsets().enumerate() {
                    f(i, accessor.get(offset));
                }
            }
            PosList::Rows(list) => {
                let rows = list.as_slice();
                let mut chunks: Vec<Option<Arc<Chunk>>> =
                    vec![None; self.table.chunk_count() as usize];

                let mut i = 0;
                while i < rows.len() {
                    let row = rows[i];
                    if row.is_null() {
                        f(i, None);
                        i += 1;
                        continue;
                    }

                    let chunk_id = row.chunk_id;
                    let slot = &mut chunks[chunk_id.as_usize()];
                    if slot.is_none() {
                        *slot = Some(self.resolve_chunk(chunk_id));
                    }
                    let chunk = slot.as_ref().expect("chunk handle was just cached").clone();
                    let accessor = T::accessor(chunk.segment(self.column_id));

                    // Consume the whole same-chunk run with one accessor.
                    while i < rows.len() && rows[i].chunk_id == chunk_id {
                        f(i, accessor.get(rows[i].offset));
                        i += 1;
                    }
                }
            }
        }
    }

    /// Visits every exposed row as a dynamic [`Value`].
    pub fn for_each_value<F>(&self, mut f: F)
    where
        F: FnMut(usize, Value),
    {
        match self.data_type() {
            DataType::Int64 => {
                self.for_each_typed::<i64, _>(|i, v| f(i, v.map_or(Value::Null, Value::Int64)));
            }
            DataType::Float64 => {
                self.for_each_typed::<f64, _>(|i, v| f(i, v.map_or(Value::Null, Value::Float64)));
            }
            DataType::Bool => {
                self.for_each_typed::<bool, _>(|i, v| f(i, v.map_or(Value::Null, Value::Bool)));
            }
            DataType::Text => {
                self.for_each_typed::<arcstr::ArcStr, _>(|i, v| {
                    f(i, v.map_or(Value::Null, Value::Text));
                });
            }
        }
    }

    /// Materializes the value at position `index` of this view.
    ///
    /// Point access resolves the chunk on every call; passes use
    /// [`for_each_typed`](Self::for_each_typed) instead.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Value {
        let row = self.pos_list.row_at(index);
        if row.is_null() {
            return Value::Null;
        }
        let chunk = self.resolve_chunk(row.chunk_id);
        chunk.segment(self.column_id).value_at(row.offset)
    }

    /// Materializes the whole view in order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each_value(|_, v| out.push(v));
        out
    }

    /// Approximate heap size (the shared position list is attributed to
    /// each segment built from it).
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.pos_list.memory_usage()
    }

    fn resolve_chunk(&self, chunk_id: ChunkId) -> Arc<Chunk> {
        self.table.get_chunk(chunk_id).unwrap_or_else(|| {
            panic!("reference segment points into physically removed {chunk_id:?}")
        })
    }
}

impl fmt::Debug for ReferenceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSegment")
            .field("column_id", &self.column_id)
            .field("rows", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::pos_list::{RowIdPosList, SingleChunkPosList};
    use crate::storage::segment::Segment;
    use crate::storage::table::{ColumnDefinition, UseMvcc};
    use tessera_common::types::{ChunkOffset, RowId};

    fn base_table() -> Arc<Table> {
        let table = Table::with_options(
            vec![
                ColumnDefinition::new("a", DataType::Int64, false),
                ColumnDefinition::new("b", DataType::Text, true),
            ],
            TableKind::Data,
            Some(2),
            UseMvcc::No,
        );
        // Chunk 0: (1, "one"), (2, NULL); chunk 1: (3, "three").
        table.append(&[Value::Int64(1), Value::Text("one".into())]);
        table.append(&[Value::Int64(2), Value::Null]);
        table.append(&[Value::Int64(3), Value::Text("three".into())]);
        Arc::new(table)
    }

    #[test]
    fn test_single_chunk_fast_path() {
        let table = base_table();
        // Offsets reversed on purpose: order comes from the list.
        let pos_list = Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
            ChunkId::new(0),
            vec![ChunkOffset::new(1), ChunkOffset::new(0)],
        )));
        let segment = ReferenceSegment::new(table, ColumnId::new(0), pos_list);

        let mut seen = Vec::new();
        segment.for_each_typed::<i64, _>(|i, v| seen.push((i, v)));
        assert_eq!(seen, vec![(0, Some(2)), (1, Some(1))]);
    }

    #[test]
    fn test_general_path_across_chunks_with_nulls() {
        let table = base_table();
        let pos_list = Arc::new(PosList::Rows(RowIdPosList::new(vec![
            RowId::new(ChunkId::new(1), ChunkOffset::new(0)),
            RowId::NULL,
            RowId::new(ChunkId::new(0), ChunkOffset::new(1)),
            RowId::new(ChunkId::new(0), ChunkOffset::new(0)),
        ])));
        let segment = ReferenceSegment::new(table, ColumnId::new(1), pos_list);

        // Position i yields the base value at P[i]; null markers and
        // null base values both surface as Null.
        assert_eq!(
            segment.values(),
            vec![
                Value::Text("three".into()),
                Value::Null,
                Value::Null,
                Value::Text("one".into()),
            ]
        );
        assert_eq!(segment.value_at(3), Value::Text("one".into()));
    }

    #[test]
    fn test_empty_view() {
        let table = base_table();
        let pos_list = Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
            ChunkId::new(0),
            Vec::new(),
        )));
        let segment = ReferenceSegment::new(table, ColumnId::new(0), pos_list);
        assert!(segment.is_empty());
        segment.for_each_value(|_, _| panic!("no rows expected"));
    }

    #[test]
    #[should_panic(expected = "must point at a data table")]
    fn test_reference_chain_is_rejected() {
        let table = base_table();
        let pos_list = Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
            ChunkId::new(0),
            vec![ChunkOffset::new(0)],
        )));
        let segment = ReferenceSegment::new(Arc::clone(&table), ColumnId::new(0), pos_list);

        let references = Arc::new(Table::new(
            table.column_definitions().to_vec(),
            TableKind::References,
        ));
        references.append_chunk(
            vec![
                Segment::Reference(segment),
                Segment::Reference(ReferenceSegment::new(
                    Arc::clone(&table),
                    ColumnId::new(1),
                    Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
                        ChunkId::new(0),
                        vec![ChunkOffset::new(0)],
                    ))),
                )),
            ],
            None,
        );

        // Chaining through the reference table is the fatal case.
        let chained = Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
            ChunkId::new(0),
            vec![ChunkOffset::new(0)],
        )));
        let _ = ReferenceSegment::new(references, ColumnId::new(0), chained);
    }

    #[test]
    #[should_panic(expected = "segment type mismatch")]
    fn test_typed_access_with_wrong_type_panics() {
        let table = base_table();
        let pos_list = Arc::new(PosList::SingleChunk(SingleChunkPosList::from_offsets(
            ChunkId::new(0),
            vec![ChunkOffset::new(0)],
        )));
        let segment = ReferenceSegment::new(table, ColumnId::new(0), pos_list);
        segment.for_each_typed::<f64, _>(|_, _| {});
    }
}
