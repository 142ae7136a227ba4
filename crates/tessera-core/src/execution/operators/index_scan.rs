//! The index scan operator.
//!
//! For each chunk of a base table, an index scan consults that chunk's
//! secondary index, translates the predicate into one or two index
//! ranges, and emits the matching rows as a single-chunk position list.
//! The results are assembled into a `References`-kind output table: one
//! reference segment per input column, one output chunk per non-empty
//! input chunk.
//!
//! Execution is chunk-parallel: one scheduler task per chunk, joined at
//! a single synchronization point. Output chunk order is whatever task
//! completion order produces; rows from one input chunk stay together,
//! in index order.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tessera_common::types::{ChunkId, ColumnId, PredicateCondition, RowId, Value};

use crate::context::EngineContext;
use crate::scheduler::{SchedulePriority, Task};
use crate::storage::chunk::{Chunk, ChunkIndex};
use crate::storage::index::IndexKind;
use crate::storage::pos_list::{PosList, RowIdPosList, SingleChunkPosList};
use crate::storage::reference_segment::ReferenceSegment;
use crate::storage::segment::Segment;
use crate::storage::table::{Table, TableKind, UseMvcc};

/// Lifecycle of an operator execution. No retry loop: a fatal validation
/// failure aborts before anything is scheduled.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum OperatorState {
    /// Constructed, not yet validated.
    Created = 0,
    /// Inputs validated, nothing scheduled yet.
    Validated = 1,
    /// Per-chunk tasks are running.
    Executing = 2,
    /// All tasks have completed.
    Synchronized = 3,
    /// The result table has been handed out.
    Done = 4,
}

impl OperatorState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Validated,
            2 => Self::Executing,
            3 => Self::Synchronized,
            4 => Self::Done,
            _ => unreachable!("invalid operator state {raw}"),
        }
    }
}

/// Parameters shared by every per-chunk task of one scan.
struct ScanParams {
    in_table: Arc<Table>,
    out_table: Arc<Table>,
    /// Serializes result-chunk appends; held only per insertion.
    output_lock: Mutex<()>,
    index_kind: IndexKind,
    column_ids: Vec<ColumnId>,
    condition: PredicateCondition,
    right_values: Vec<Value>,
    right_values2: Vec<Value>,
}

/// A chunk-parallel, index-accelerated scan over a data table.
pub struct IndexScan {
    in_table: Arc<Table>,
    index_kind: IndexKind,
    left_column_ids: Vec<ColumnId>,
    predicate_condition: PredicateCondition,
    right_values: Vec<Value>,
    right_values2: Vec<Value>,
    /// Restricts the scan to these chunk ids; `None` scans every chunk.
    pub included_chunk_ids: Option<Vec<ChunkId>>,
    state: AtomicU8,
}

impl IndexScan {
    /// Creates a scan of `in_table` using per-chunk indexes of
    /// `index_kind` over `left_column_ids`.
    ///
    /// `right_values2` is only consulted for between predicates.
    #[must_use]
    pub fn new(
        in_table: Arc<Table>,
        index_kind: IndexKind,
        left_column_ids: Vec<ColumnId>,
        predicate_condition: PredicateCondition,
        right_values: Vec<Value>,
        right_values2: Vec<Value>,
    ) -> Self {
        Self {
            in_table,
            index_kind,
            left_column_ids,
            predicate_condition,
            right_values,
            right_values2,
            included_chunk_ids: None,
            state: AtomicU8::new(OperatorState::Created as u8),
        }
    }

    /// The operator's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> OperatorState {
        OperatorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: OperatorState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Runs the scan and returns the `References`-kind result table.
    ///
    /// Blocks until every per-chunk task has completed. Chunks that were
    /// physically removed — before scheduling or mid-scan — are skipped,
    /// not errors.
    ///
    /// # Panics
    /// Panics on invalid input (unsupported predicate kind, arity
    /// mismatch, non-data input table, missing index) and when called
    /// more than once.
    pub fn execute(&self, context: &EngineContext) -> Arc<Table> {
        assert_eq!(
            self.state(),
            OperatorState::Created,
            "an index scan executes exactly once"
        );
        self.validate_input();
        self.set_state(OperatorState::Validated);

        let out_table = Arc::new(Table::with_options(
            self.in_table.column_definitions().to_vec(),
            TableKind::References,
            None,
            UseMvcc::No,
        ));
        let params = Arc::new(ScanParams {
            in_table: Arc::clone(&self.in_table),
            out_table: Arc::clone(&out_table),
            output_lock: Mutex::new(()),
            index_kind: self.index_kind,
            column_ids: self.left_column_ids.clone(),
            condition: self.predicate_condition,
            right_values: self.right_values.clone(),
            right_values2: self.right_values2.clone(),
        });

        let chunk_ids: Vec<ChunkId> = match &self.included_chunk_ids {
            Some(ids) => ids.clone(),
            None => (0..self.in_table.chunk_count()).map(ChunkId::new).collect(),
        };

        self.set_state(OperatorState::Executing);
        let scheduler = context.scheduler();
        let num_nodes = scheduler.num_nodes();
        let mut tasks = Vec::with_capacity(chunk_ids.len());
        for chunk_id in chunk_ids {
            if self.in_table.get_chunk(chunk_id).is_none() {
                continue;
            }
            let params = Arc::clone(&params);
            let task = Arc::new(Task::job(move || scan_chunk_task(&params, chunk_id)));
            // Output lands on the node that owns the input chunk.
            scheduler.schedule(
                Arc::clone(&task),
                chunk_id.as_usize() % num_nodes,
                SchedulePriority::JobTask,
            );
            tasks.push(task);
        }
        tracing::trace!(tasks = tasks.len(), "index scan scheduled");

        scheduler.wait_for_tasks(&tasks);
        self.set_state(OperatorState::Synchronized);

        self.set_state(OperatorState::Done);
        out_table
    }

    fn validate_input(&self) {
        assert!(
            !matches!(
                self.predicate_condition,
                PredicateCondition::Like | PredicateCondition::NotLike
            ),
            "predicate condition {} not supported by index scan",
            self.predicate_condition
        );
        assert_eq!(
            self.left_column_ids.len(),
            self.right_values.len(),
            "count mismatch: left column ids and right values differ in size"
        );
        if self.predicate_condition.is_between() {
            assert_eq!(
                self.left_column_ids.len(),
                self.right_values2.len(),
                "count mismatch: left column ids and second right values differ in size"
            );
        }
        assert!(
            self.in_table.kind() == TableKind::Data,
            "index scan only supports data tables; indexes are maintained nowhere else"
        );
        assert!(
            self.index_kind != IndexKind::Hash
                || self.predicate_condition == PredicateCondition::Equals,
            "hash indexes only answer equality predicates"
        );
    }
}

fn scan_chunk_task(params: &ScanParams, chunk_id: ChunkId) {
    // A chunk physically removed mid-scan is skipped, not an error.
    let Some(chunk) = params.in_table.get_chunk(chunk_id) else {
        return;
    };

    let matches = scan_chunk(params, chunk_id, &chunk);
    if matches.is_empty() {
        return;
    }

    let pos_list = Arc::new(matches);
    let segments: Vec<Segment> = (0..params.in_table.column_count())
        .map(|column| {
            Segment::Reference(ReferenceSegment::new(
                Arc::clone(&params.in_table),
                ColumnId::new(column),
                Arc::clone(&pos_list),
            ))
        })
        .collect();

    let _lock = params.output_lock.lock();
    params.out_table.append_chunk(segments, None);
}

fn scan_chunk(params: &ScanParams, chunk_id: ChunkId, chunk: &Chunk) -> PosList {
    let index = chunk
        .get_index(params.index_kind, &params.column_ids)
        .unwrap_or_else(|| {
            panic!(
                "no {:?} index over columns {:?} on {chunk_id:?}",
                params.index_kind, params.column_ids
            )
        });

    let index = match index {
        ChunkIndex::Hash(hash) => {
            // Validated: hash indexes serve equality only.
            let offsets = hash.positions_for(&params.right_values).to_vec();
            return PosList::SingleChunk(SingleChunkPosList::from_offsets(chunk_id, offsets));
        }
        ChunkIndex::Ordered(index) => index,
    };

    let values = &params.right_values;
    let values2 = &params.right_values2;
    let (start, end) = match params.condition {
        PredicateCondition::Equals => (index.lower_bound(values), index.upper_bound(values)),
        PredicateCondition::LessThan => (0, index.lower_bound(values)),
        PredicateCondition::LessThanEquals => (0, index.upper_bound(values)),
        PredicateCondition::GreaterThan => (index.upper_bound(values), index.len()),
        PredicateCondition::GreaterThanEquals => (index.lower_bound(values), index.len()),
        PredicateCondition::BetweenInclusive => {
            (index.lower_bound(values), index.upper_bound(values2))
        }
        PredicateCondition::BetweenLowerExclusive => {
            (index.upper_bound(values), index.upper_bound(values2))
        }
        PredicateCondition::BetweenUpperExclusive => {
            (index.lower_bound(values), index.lower_bound(values2))
        }
        PredicateCondition::BetweenExclusive => {
            (index.upper_bound(values), index.lower_bound(values2))
        }
        PredicateCondition::NotEquals => {
            // A range with a hole cannot be expressed by the single-range
            // shape; both sub-ranges are materialized eagerly instead.
            let mut rows = RowIdPosList::default();
            for position in 0..index.lower_bound(values) {
                rows.push(RowId::new(chunk_id, index.offset_at(position)));
            }
            for position in index.upper_bound(values)..index.len() {
                rows.push(RowId::new(chunk_id, index.offset_at(position)));
            }
            return PosList::Rows(rows);
        }
        PredicateCondition::Like | PredicateCondition::NotLike => {
            unreachable!("rejected during validation")
        }
    };

    // Crossed bounds (e.g. BETWEEN with hi < lo) mean an empty result.
    let end = end.max(start);
    PosList::SingleChunk(SingleChunkPosList::from_index_range(chunk_id, index, start, end))
}
