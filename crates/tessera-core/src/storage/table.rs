//! Tables: ordered, append-only collections of chunk slots.
//!
//! A `Data` table owns mutable base data: rows are appended into the
//! last mutable chunk (serialized by the table's append lock), full
//! chunks are finalized and a fresh one is rotated in. A `References`
//! table is the write-once result shape of operators: every segment is a
//! reference segment and nothing is modified after construction.
//!
//! Chunk slots hold fully-formed `Arc<Chunk>`s — a reader either sees a
//! complete chunk or a tombstone, never something half-built. Physically
//! removed chunks leave their slot empty so chunk ids stay stable.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessera_common::error::{Result, StorageError};
use tessera_common::mvcc::MvccData;
use tessera_common::types::{
    ChunkId, ChunkOffset, ColumnId, CommitId, DataType, RowId, TxId, Value,
};

use super::chunk::Chunk;
use super::segment::{DictionarySegment, Segment, ValueSegment};

/// Definition of one table column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDefinition {
    /// Column name, unique within the table.
    pub name: String,
    /// Column data type.
    pub data_type: DataType,
    /// Whether the column accepts nulls.
    pub nullable: bool,
}

impl ColumnDefinition {
    /// Creates a column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// What a table stores.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableKind {
    /// Mutable base data.
    Data,
    /// Write-once reference segments produced by operators.
    References,
}

/// Whether a data table tracks per-row MVCC visibility.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UseMvcc {
    /// Track visibility metadata per chunk.
    Yes,
    /// Plain storage without visibility tracking.
    No,
}

/// A registered uniqueness/primary-key constraint.
///
/// Constraints are soft: registration validates against existing
/// constraints, not against the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableKeyConstraint {
    /// Covered columns, sorted.
    pub column_ids: Vec<ColumnId>,
    /// Whether this is the table's primary key.
    pub is_primary_key: bool,
}

#[derive(Default)]
struct AppendState {
    constraints: Vec<TableKeyConstraint>,
}

/// A chunked, column-major table.
pub struct Table {
    column_definitions: Vec<ColumnDefinition>,
    kind: TableKind,
    use_mvcc: UseMvcc,
    target_chunk_size: u32,
    chunks: RwLock<Vec<Option<Arc<Chunk>>>>,
    /// Serializes chunk rotation/row appends and constraint registration.
    append_state: Mutex<AppendState>,
}

impl Table {
    /// Creates an empty table with default chunk size and no MVCC.
    #[must_use]
    pub fn new(column_definitions: Vec<ColumnDefinition>, kind: TableKind) -> Self {
        Self::with_options(column_definitions, kind, None, UseMvcc::No)
    }

    /// Creates an empty table.
    ///
    /// # Panics
    /// Panics if a chunk size is supplied for a `References` table, the
    /// chunk size is zero, MVCC is requested for a `References` table,
    /// or the column list is empty.
    #[must_use]
    pub fn with_options(
        column_definitions: Vec<ColumnDefinition>,
        kind: TableKind,
        target_chunk_size: Option<u32>,
        use_mvcc: UseMvcc,
    ) -> Self {
        assert!(!column_definitions.is_empty(), "a table needs at least one column");
        assert!(
            kind == TableKind::Data || target_chunk_size.is_none(),
            "must not set a target chunk size for reference tables"
        );
        assert!(
            kind == TableKind::Data || use_mvcc == UseMvcc::No,
            "only data tables track MVCC visibility"
        );
        let target_chunk_size = match kind {
            TableKind::Data => target_chunk_size.unwrap_or(Chunk::DEFAULT_SIZE),
            TableKind::References => u32::MAX,
        };
        assert!(target_chunk_size > 0, "a table needs a chunk size greater than zero");

        Self {
            column_definitions,
            kind,
            use_mvcc,
            target_chunk_size,
            chunks: RwLock::new(Vec::new()),
            append_state: Mutex::new(AppendState::default()),
        }
    }

    /// The table's kind.
    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Whether the table tracks MVCC visibility.
    #[must_use]
    pub fn uses_mvcc(&self) -> UseMvcc {
        self.use_mvcc
    }

    /// The capacity new mutable chunks are created with.
    ///
    /// # Panics
    /// Panics for `References` tables, which have no append path.
    #[must_use]
    pub fn target_chunk_size(&self) -> u32 {
        assert!(
            self.kind == TableKind::Data,
            "target_chunk_size is only defined for data tables"
        );
        self.target_chunk_size
    }

    // --- column metadata ---------------------------------------------------

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> u16 {
        self.column_definitions.len() as u16
    }

    /// All column definitions in order.
    #[must_use]
    pub fn column_definitions(&self) -> &[ColumnDefinition] {
        &self.column_definitions
    }

    /// The name of a column.
    ///
    /// # Panics
    /// Panics if the column id is out of range.
    #[must_use]
    pub fn column_name(&self, column_id: ColumnId) -> &str {
        &self.column_definition(column_id).name
    }

    /// The data type of a column.
    ///
    /// # Panics
    /// Panics if the column id is out of range.
    #[must_use]
    pub fn column_data_type(&self, column_id: ColumnId) -> DataType {
        self.column_definition(column_id).data_type
    }

    /// Whether a column accepts nulls.
    ///
    /// # Panics
    /// Panics if the column id is out of range.
    #[must_use]
    pub fn column_is_nullable(&self, column_id: ColumnId) -> bool {
        self.column_definition(column_id).nullable
    }

    /// Resolves a column by name.
    ///
    /// # Panics
    /// Panics if no column carries that name.
    #[must_use]
    pub fn column_id_by_name(&self, name: &str) -> ColumnId {
        let position = self
            .column_definitions
            .iter()
            .position(|def| def.name == name)
            .unwrap_or_else(|| panic!("no column named '{name}'"));
        ColumnId::new(position as u16)
    }

    fn column_definition(&self, column_id: ColumnId) -> &ColumnDefinition {
        assert!(
            column_id.as_usize() < self.column_definitions.len(),
            "{column_id:?} out of range ({} columns)",
            self.column_definitions.len()
        );
        &self.column_definitions[column_id.as_usize()]
    }

    // --- appending ---------------------------------------------------------

    /// Appends one row outside any transaction; it is visible from the
    /// first snapshot on MVCC tables.
    pub fn append(&self, values: &[Value]) {
        self.append_with_tx(values, TxId::INVALID);
    }

    /// Appends one row on behalf of a transaction.
    ///
    /// Rotates to a fresh mutable chunk when the last one is absent,
    /// full or already finalized — callers never pre-check capacity. A
    /// table never keeps two mutable chunks once a new one exists.
    ///
    /// # Panics
    /// Panics on `References` tables and on arity/type mismatches.
    pub fn append_with_tx(&self, values: &[Value], tx: TxId) {
        assert!(
            self.kind == TableKind::Data,
            "rows can only be appended to data tables"
        );
        let _append = self.append_state.lock();

        let last = self.chunks.read().last().cloned().flatten();
        let chunk = match last {
            Some(c) if c.is_mutable() && c.size() < self.target_chunk_size => c,
            other => {
                if let Some(full) = other {
                    if full.is_mutable() {
                        full.finalize();
                    }
                }
                self.append_mutable_chunk()
            }
        };

        let offset = ChunkOffset::new(chunk.size());
        chunk.append_row(values);

        if let Some(mvcc) = chunk.mvcc_data() {
            if tx.is_valid() {
                mvcc.register_insert(offset, tx);
            } else {
                mvcc.commit_insert(offset, CommitId::new(0));
            }
        }
    }

    /// Builds and publishes a fresh mutable chunk. Caller holds the
    /// append lock.
    fn append_mutable_chunk(&self) -> Arc<Chunk> {
        let segments = self
            .column_definitions
            .iter()
            .map(|def| {
                Segment::Value(ValueSegment::new(
                    def.data_type,
                    def.nullable,
                    self.target_chunk_size as usize,
                ))
            })
            .collect();
        let mvcc = match self.use_mvcc {
            UseMvcc::Yes => Some(Arc::new(MvccData::new(self.target_chunk_size as usize))),
            UseMvcc::No => None,
        };

        let chunk = Arc::new(Chunk::new(segments, mvcc));
        self.chunks.write().push(Some(Arc::clone(&chunk)));
        chunk
    }

    /// Publishes a fully-formed chunk as the last slot.
    ///
    /// The chunk is finalized before publication, so no reader ever
    /// observes it in a partially built state.
    ///
    /// # Panics
    /// Panics if the segment count, segment types or segment shapes do
    /// not match the table, or if MVCC data presence disagrees with the
    /// table's MVCC flag.
    pub fn append_chunk(&self, segments: Vec<Segment>, mvcc: Option<Arc<MvccData>>) {
        match self.kind {
            TableKind::Data => assert!(
                mvcc.is_some() == (self.use_mvcc == UseMvcc::Yes),
                "supply MVCC data to data tables iff the table tracks visibility"
            ),
            TableKind::References => {
                assert!(mvcc.is_none(), "reference tables never carry MVCC data");
            }
        }
        assert_eq!(
            segments.len(),
            self.column_definitions.len(),
            "chunk does not have the table's column count"
        );
        for (definition, segment) in self.column_definitions.iter().zip(&segments) {
            assert_eq!(
                segment.data_type(),
                definition.data_type,
                "segment type mismatch for column '{}'",
                definition.name
            );
            assert_eq!(
                segment.is_reference(),
                self.kind == TableKind::References,
                "segment shape does not match the table kind"
            );
        }

        let chunk = Chunk::new(segments, mvcc);
        chunk.finalize();
        self.chunks.write().push(Some(Arc::new(chunk)));
    }

    /// Finalizes the last chunk if present and still mutable, e.g.
    /// before building indexes over it.
    pub fn finalize_last_chunk(&self) {
        if self.chunk_count() == 0 {
            return;
        }
        if let Some(chunk) = self.last_chunk() {
            if chunk.is_mutable() {
                chunk.finalize();
            }
        }
    }

    // --- chunk access ------------------------------------------------------

    /// Number of chunk slots, tombstones included.
    #[must_use]
    pub fn chunk_count(&self) -> u32 {
        self.chunks.read().len() as u32
    }

    /// The chunk in a slot, or `None` if it was physically removed.
    ///
    /// # Panics
    /// Panics if the chunk id is out of range.
    #[must_use]
    pub fn get_chunk(&self, chunk_id: ChunkId) -> Option<Arc<Chunk>> {
        let chunks = self.chunks.read();
        assert!(
            chunk_id.as_usize() < chunks.len(),
            "{chunk_id:?} out of range ({} slots)",
            chunks.len()
        );
        chunks[chunk_id.as_usize()].clone()
    }

    /// The chunk in the last slot, or `None` if it was removed.
    ///
    /// # Panics
    /// Panics if the table has no chunks.
    #[must_use]
    pub fn last_chunk(&self) -> Option<Arc<Chunk>> {
        let chunks = self.chunks.read();
        assert!(!chunks.is_empty(), "last_chunk() called on a table without chunks");
        chunks.last().expect("slot vector is non-empty").clone()
    }

    /// Physically clears a chunk slot, leaving a tombstone.
    ///
    /// # Panics
    /// Panics unless this is a data table, the slot is occupied, and
    /// every row of the chunk has been invalidated — removal must never
    /// discard live data.
    pub fn remove_chunk(&self, chunk_id: ChunkId) {
        assert!(
            self.kind == TableKind::Data,
            "chunks can only be removed from data tables"
        );
        let chunk = self
            .get_chunk(chunk_id)
            .unwrap_or_else(|| panic!("{chunk_id:?} was already removed"));
        assert!(
            chunk.invalid_row_count() == chunk.size(),
            "physical delete of {chunk_id:?} prevented: all rows must be invalidated first"
        );
        self.chunks.write()[chunk_id.as_usize()] = None;
    }

    /// Total rows across present chunks. Removed chunks contribute zero.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.chunks
            .read()
            .iter()
            .flatten()
            .map(|chunk| u64::from(chunk.size()))
            .sum()
    }

    /// Returns `true` if no present chunk holds a row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Approximate heap size of the table and its present chunks.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        let chunks: usize = self
            .chunks
            .read()
            .iter()
            .flatten()
            .map(|chunk| chunk.memory_usage())
            .sum();
        let names: usize = self
            .column_definitions
            .iter()
            .map(|def| def.name.len())
            .sum();
        std::mem::size_of::<Self>() + chunks + names
    }

    // --- rows --------------------------------------------------------------

    /// Materializes one logical row across chunks. Development helper —
    /// not a hot path.
    ///
    /// # Panics
    /// Panics if the row index is out of bounds.
    #[must_use]
    pub fn get_row(&self, row_idx: u64) -> Vec<Value> {
        let mut remaining = row_idx;
        for chunk_id in 0..self.chunk_count() {
            let Some(chunk) = self.get_chunk(ChunkId::new(chunk_id)) else {
                continue;
            };
            if remaining < u64::from(chunk.size()) {
                let offset = ChunkOffset::new(remaining as u32);
                return (0..chunk.column_count())
                    .map(|c| chunk.segment(ColumnId::new(c)).value_at(offset))
                    .collect();
            }
            remaining -= u64::from(chunk.size());
        }
        panic!("row index {row_idx} out of bounds");
    }

    /// Claims a row for a deleting/updating transaction.
    ///
    /// # Errors
    /// Returns [`StorageError::WriteConflict`] when another in-flight
    /// transaction already owns the row (first committer wins).
    pub fn lock_row_for_update(&self, row: RowId, tx: TxId) -> Result<()> {
        let chunk = self
            .get_chunk(row.chunk_id)
            .unwrap_or_else(|| panic!("cannot lock a row in removed {:?}", row.chunk_id));
        let mvcc = chunk
            .mvcc_data()
            .expect("table does not track row visibility");
        if mvcc.try_lock_row(row.offset, tx) {
            Ok(())
        } else {
            Err(StorageError::WriteConflict {
                chunk_id: row.chunk_id,
                offset: row.offset,
            })
        }
    }

    // --- encoding ----------------------------------------------------------

    /// Re-encodes a finalized chunk's value segments as dictionary
    /// segments, republishing the slot atomically. MVCC metadata and
    /// indexes carry over since row offsets are unchanged.
    ///
    /// # Panics
    /// Panics for non-data tables, removed chunks and mutable chunks.
    pub fn encode_chunk(&self, chunk_id: ChunkId) {
        assert!(
            self.kind == TableKind::Data,
            "only data tables can be dictionary-encoded"
        );
        let chunk = self
            .get_chunk(chunk_id)
            .unwrap_or_else(|| panic!("cannot encode removed {chunk_id:?}"));
        assert!(!chunk.is_mutable(), "finalize a chunk before encoding it");

        let encoded: Vec<Segment> = chunk
            .segments()
            .iter()
            .map(|segment| match segment {
                Segment::Value(v) => Segment::Dictionary(DictionarySegment::compress(v)),
                Segment::Dictionary(d) => Segment::Dictionary(d.clone()),
                Segment::Reference(_) => {
                    unreachable!("data tables never hold reference segments")
                }
            })
            .collect();

        let replacement = Chunk::new(encoded, chunk.mvcc_data().cloned());
        replacement.finalize();
        replacement.adopt_indexes_from(&chunk);
        self.chunks.write()[chunk_id.as_usize()] = Some(Arc::new(replacement));
    }

    // --- constraints -------------------------------------------------------

    /// Registers a soft uniqueness/primary-key constraint.
    ///
    /// Serialized against concurrent appends by the append lock.
    ///
    /// # Errors
    /// At most one primary key per table; no duplicate constraint on the
    /// same column set (order-insensitive); primary-key columns must be
    /// non-nullable.
    ///
    /// # Panics
    /// Panics if a column id is out of range.
    pub fn add_soft_key_constraint(
        &self,
        column_ids: &[ColumnId],
        is_primary_key: bool,
    ) -> Result<()> {
        for column_id in column_ids {
            // Range check is a programmer error, not a recoverable one.
            let _ = self.column_definition(*column_id);
        }

        let mut state = self.append_state.lock();

        if is_primary_key {
            if state.constraints.iter().any(|c| c.is_primary_key) {
                return Err(StorageError::PrimaryKeyAlreadyExists);
            }
            for column_id in column_ids {
                if self.column_is_nullable(*column_id) {
                    return Err(StorageError::NullablePrimaryKeyColumn(column_id.as_u16()));
                }
            }
        }

        let mut sorted = column_ids.to_vec();
        sorted.sort_unstable();
        if state.constraints.iter().any(|c| c.column_ids == sorted) {
            return Err(StorageError::ConstraintAlreadyExists);
        }

        state.constraints.push(TableKeyConstraint {
            column_ids: sorted,
            is_primary_key,
        });
        Ok(())
    }

    /// The registered key constraints.
    #[must_use]
    pub fn soft_key_constraints(&self) -> Vec<TableKeyConstraint> {
        self.append_state.lock().constraints.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_defs() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("a", DataType::Int64, false),
            ColumnDefinition::new("b", DataType::Float64, true),
        ]
    }

    fn data_table(chunk_size: u32) -> Table {
        Table::with_options(two_column_defs(), TableKind::Data, Some(chunk_size), UseMvcc::No)
    }

    #[test]
    fn test_chunk_capacity_invariant() {
        let table = data_table(2);
        for i in 0..5 {
            table.append(&[Value::Int64(i), Value::Float64(i as f64)]);
        }

        // Every chunk except the last has exactly the target size.
        assert_eq!(table.chunk_count(), 3);
        assert_eq!(table.get_chunk(ChunkId::new(0)).unwrap().size(), 2);
        assert_eq!(table.get_chunk(ChunkId::new(1)).unwrap().size(), 2);
        assert_eq!(table.get_chunk(ChunkId::new(2)).unwrap().size(), 1);
        assert_eq!(table.row_count(), 5);

        // Only the last chunk is still mutable.
        assert!(!table.get_chunk(ChunkId::new(0)).unwrap().is_mutable());
        assert!(!table.get_chunk(ChunkId::new(1)).unwrap().is_mutable());
        assert!(table.get_chunk(ChunkId::new(2)).unwrap().is_mutable());
    }

    #[test]
    fn test_mvcc_tables_carry_metadata() {
        let table =
            Table::with_options(two_column_defs(), TableKind::Data, Some(4), UseMvcc::Yes);
        table.append(&[Value::Int64(1), Value::Null]);
        let chunk = table.get_chunk(ChunkId::new(0)).unwrap();
        assert!(chunk.has_mvcc_data());

        // Untracked appends are visible from the first snapshot.
        let mvcc = chunk.mvcc_data().unwrap();
        assert!(mvcc.is_row_visible(ChunkOffset::new(0), CommitId::new(0), TxId::INVALID));
    }

    #[test]
    #[should_panic(expected = "data tables")]
    fn test_append_to_reference_table_panics() {
        let table = Table::new(two_column_defs(), TableKind::References);
        table.append(&[Value::Int64(1), Value::Float64(1.0)]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_chunk_out_of_range_panics() {
        let table = data_table(2);
        let _ = table.get_chunk(ChunkId::new(0));
    }

    #[test]
    #[should_panic(expected = "segment type mismatch")]
    fn test_append_chunk_type_mismatch_panics() {
        let table = data_table(2);
        let wrong = ValueSegment::new(DataType::Int64, false, 2);
        wrong.push_value(&Value::Int64(1));
        let also_wrong = ValueSegment::new(DataType::Int64, true, 2);
        also_wrong.push_value(&Value::Int64(2));
        table.append_chunk(
            vec![Segment::Value(wrong), Segment::Value(also_wrong)],
            None,
        );
    }

    #[test]
    fn test_remove_chunk_requires_full_invalidation() {
        let table =
            Table::with_options(two_column_defs(), TableKind::Data, Some(2), UseMvcc::Yes);
        table.append(&[Value::Int64(1), Value::Null]);
        table.append(&[Value::Int64(2), Value::Null]);

        let chunk = table.get_chunk(ChunkId::new(0)).unwrap();
        let mvcc = chunk.mvcc_data().unwrap();
        for offset in 0..2 {
            assert!(mvcc.try_lock_row(ChunkOffset::new(offset), TxId::new(9)));
            mvcc.commit_delete(ChunkOffset::new(offset), CommitId::new(3));
        }

        table.remove_chunk(ChunkId::new(0));
        assert!(table.get_chunk(ChunkId::new(0)).is_none());
        // Slot ids are stable; aggregates skip the tombstone.
        assert_eq!(table.chunk_count(), 1);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    #[should_panic(expected = "all rows must be invalidated")]
    fn test_remove_live_chunk_panics() {
        let table =
            Table::with_options(two_column_defs(), TableKind::Data, Some(2), UseMvcc::Yes);
        table.append(&[Value::Int64(1), Value::Null]);
        table.remove_chunk(ChunkId::new(0));
    }

    #[test]
    fn test_append_after_removed_last_chunk_starts_fresh() {
        let table =
            Table::with_options(two_column_defs(), TableKind::Data, Some(1), UseMvcc::Yes);
        table.append(&[Value::Int64(1), Value::Null]);
        let chunk = table.get_chunk(ChunkId::new(0)).unwrap();
        let mvcc = chunk.mvcc_data().unwrap();
        assert!(mvcc.try_lock_row(ChunkOffset::new(0), TxId::new(1)));
        mvcc.commit_delete(ChunkOffset::new(0), CommitId::new(1));
        table.remove_chunk(ChunkId::new(0));

        table.append(&[Value::Int64(2), Value::Null]);
        assert_eq!(table.chunk_count(), 2);
        assert_eq!(table.get_row(0), vec![Value::Int64(2), Value::Null]);
    }

    #[test]
    fn test_column_metadata() {
        let table = data_table(2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_name(ColumnId::new(1)), "b");
        assert_eq!(table.column_data_type(ColumnId::new(0)), DataType::Int64);
        assert!(table.column_is_nullable(ColumnId::new(1)));
        assert_eq!(table.column_id_by_name("b"), ColumnId::new(1));
    }

    #[test]
    #[should_panic(expected = "no column named")]
    fn test_unknown_column_name_panics() {
        let table = data_table(2);
        let _ = table.column_id_by_name("missing");
    }

    #[test]
    fn test_constraint_rules() {
        let defs = vec![
            ColumnDefinition::new("a", DataType::Int64, false),
            ColumnDefinition::new("b", DataType::Int64, false),
            ColumnDefinition::new("c", DataType::Int64, true),
        ];
        let table = Table::new(defs, TableKind::Data);
        let a = ColumnId::new(0);
        let b = ColumnId::new(1);

        assert!(table.add_soft_key_constraint(&[a], true).is_ok());
        // A second primary key fails.
        assert_eq!(
            table.add_soft_key_constraint(&[b], true),
            Err(StorageError::PrimaryKeyAlreadyExists)
        );
        // Same column set fails regardless of order.
        assert!(table.add_soft_key_constraint(&[a, b], false).is_ok());
        assert_eq!(
            table.add_soft_key_constraint(&[b, a], false),
            Err(StorageError::ConstraintAlreadyExists)
        );
        // A distinct set succeeds.
        assert!(table.add_soft_key_constraint(&[b], false).is_ok());
        assert_eq!(table.soft_key_constraints().len(), 3);
        // The table is unchanged by failed registrations.
        assert_eq!(
            table.add_soft_key_constraint(&[a, b], false),
            Err(StorageError::ConstraintAlreadyExists)
        );
        assert_eq!(table.soft_key_constraints().len(), 3);

        // Nullable primary-key columns are rejected.
        let fresh = Table::new(
            vec![ColumnDefinition::new("c", DataType::Int64, true)],
            TableKind::Data,
        );
        assert_eq!(
            fresh.add_soft_key_constraint(&[ColumnId::new(0)], true),
            Err(StorageError::NullablePrimaryKeyColumn(0))
        );
    }

    #[test]
    fn test_get_row_across_chunks() {
        let table = data_table(2);
        for i in 0..3 {
            table.append(&[Value::Int64(i), Value::Float64(f64::from(i as i32))]);
        }
        assert_eq!(table.get_row(2), vec![Value::Int64(2), Value::Float64(2.0)]);
    }

    #[test]
    fn test_encode_chunk_preserves_values() {
        let table = data_table(2);
        table.append(&[Value::Int64(7), Value::Null]);
        table.append(&[Value::Int64(7), Value::Float64(0.5)]);
        table.finalize_last_chunk();
        table.encode_chunk(ChunkId::new(0));

        let chunk = table.get_chunk(ChunkId::new(0)).unwrap();
        assert!(matches!(
            chunk.segment(ColumnId::new(0)),
            Segment::Dictionary(_)
        ));
        assert_eq!(table.get_row(0), vec![Value::Int64(7), Value::Null]);
        assert_eq!(table.get_row(1), vec![Value::Int64(7), Value::Float64(0.5)]);
    }

    #[test]
    fn test_write_conflict_surfaces_as_error() {
        let table =
            Table::with_options(two_column_defs(), TableKind::Data, Some(2), UseMvcc::Yes);
        table.append(&[Value::Int64(1), Value::Null]);
        let row = RowId::new(ChunkId::new(0), ChunkOffset::new(0));

        assert!(table.lock_row_for_update(row, TxId::new(1)).is_ok());
        assert_eq!(
            table.lock_row_for_update(row, TxId::new(2)),
            Err(StorageError::WriteConflict {
                chunk_id: row.chunk_id,
                offset: row.offset
            })
        );
    }

    #[test]
    fn test_memory_usage_counts_chunks() {
        let table = data_table(8);
        let baseline = table.memory_usage();
        table.append(&[Value::Int64(1), Value::Float64(1.0)]);
        assert!(table.memory_usage() > baseline);
    }
}
