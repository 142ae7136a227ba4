//! Chunked column-major storage.
//!
//! - [`table`] - tables as append-only collections of chunk slots
//! - [`chunk`] - fixed-capacity horizontal partitions
//! - [`segment`] - typed column storage and accessors
//! - [`index`] - per-chunk secondary indexes
//! - [`pos_list`] - position lists describing filtered views
//! - [`reference_segment`] - column views through position lists
//! - [`registry`] - name-based table lookup

pub mod chunk;
pub mod index;
pub mod pos_list;
pub mod reference_segment;
pub mod registry;
pub mod segment;
pub mod table;

pub use chunk::{Chunk, ChunkIndex};
pub use index::{HashIndex, IndexKind, OrderedIndex};
pub use pos_list::{PosList, RowIdPosList, SingleChunkPosList};
pub use reference_segment::ReferenceSegment;
pub use registry::TableRegistry;
pub use segment::{
    DictionarySegment, Segment, SegmentAccessor, SegmentType, TypedColumn, TypedVec, ValueSegment,
};
pub use table::{ColumnDefinition, Table, TableKeyConstraint, TableKind, UseMvcc};
