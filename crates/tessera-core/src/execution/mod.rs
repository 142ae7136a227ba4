//! Chunk-parallel query execution.

pub mod operators;

pub use operators::{IndexScan, OperatorState};
