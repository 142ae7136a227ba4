//! Recoverable error types.
//!
//! Only caller-visible, recoverable failures live here: constraint
//! registration rejections and MVCC write conflicts. Programmer errors
//! (out-of-range ids, type mismatches, invariant violations) are not
//! representable as errors — they panic with a message naming the
//! violated invariant.

use thiserror::Error;

use crate::types::{ChunkId, ChunkOffset};

/// Result alias for recoverable storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A recoverable storage-layer failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A key constraint on the same column set is already registered.
    #[error("a key constraint on the same column set already exists")]
    ConstraintAlreadyExists,

    /// The table already carries a primary-key constraint.
    #[error("another primary key already exists for this table")]
    PrimaryKeyAlreadyExists,

    /// Primary-key columns must be non-nullable.
    #[error("column {0} is nullable and cannot be part of a primary key")]
    NullablePrimaryKeyColumn(u16),

    /// Another in-flight transaction holds the row's write lock.
    #[error("write conflict on row ({chunk_id}, {offset}): locked by another transaction")]
    WriteConflict {
        /// Chunk of the contested row.
        chunk_id: ChunkId,
        /// Offset of the contested row.
        offset: ChunkOffset,
    },
}
