//! Physical operators executing over chunked storage.
//!
//! Only the scan side lives here; join and aggregate shapes are built by
//! external plan layers on top of the same table/reference-segment and
//! scheduling primitives.

mod index_scan;

pub use index_scan::{IndexScan, OperatorState};
