//! MVCC (Multi-Version Concurrency Control) row metadata.
//!
//! Each chunk of a mutable table carries one [`MvccData`] block with
//! three per-row fields: the owning transaction id (`0` = none), the
//! begin commit id (when the row became visible) and the end commit id
//! (when it stopped being visible; [`CommitId::MAX`] = still visible).
//!
//! Readers never block: a row whose begin commit id is still the MAX
//! sentinel simply reads as "not yet visible". Writers claim a row with
//! a compare-and-swap on the owning transaction id — the first
//! committer wins, the loser observes a conflict and aborts.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::{ChunkOffset, CommitId, TxId};

/// Per-row visibility metadata for one chunk.
///
/// All fields are atomics sized to the chunk's capacity at construction,
/// so visibility updates never reallocate and can run concurrently with
/// snapshot reads.
#[derive(Debug)]
pub struct MvccData {
    /// Owning transaction per row; 0 means unowned.
    tids: Vec<AtomicU32>,
    /// Commit id at which each row became visible; MAX = not yet.
    begin_cids: Vec<AtomicU32>,
    /// Commit id at which each row stopped being visible; MAX = never.
    end_cids: Vec<AtomicU32>,
    /// Number of rows whose end commit id has been finalized.
    invalid_row_count: AtomicU32,
}

impl MvccData {
    /// Creates MVCC metadata for a chunk of the given capacity.
    ///
    /// All rows start invisible (begin = MAX), alive (end = MAX) and
    /// unowned (tid = 0).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            tids: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            begin_cids: (0..capacity)
                .map(|_| AtomicU32::new(CommitId::MAX.as_u32()))
                .collect(),
            end_cids: (0..capacity)
                .map(|_| AtomicU32::new(CommitId::MAX.as_u32()))
                .collect(),
            invalid_row_count: AtomicU32::new(0),
        }
    }

    /// Returns the row capacity this metadata was sized for.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tids.len()
    }

    /// Marks a freshly appended row as owned by the inserting transaction.
    ///
    /// The row stays invisible to other transactions until
    /// [`commit_insert`](Self::commit_insert) publishes its begin commit id.
    pub fn register_insert(&self, offset: ChunkOffset, tx: TxId) {
        self.tids[offset.as_usize()].store(tx.as_u32(), Ordering::Release);
    }

    /// Publishes an inserted row's begin commit id and releases ownership.
    pub fn commit_insert(&self, offset: ChunkOffset, cid: CommitId) {
        self.begin_cids[offset.as_usize()].store(cid.as_u32(), Ordering::Release);
        self.tids[offset.as_usize()].store(0, Ordering::Release);
    }

    /// Tries to claim a row for a deleting/updating transaction.
    ///
    /// Succeeds only if the row is currently unowned (first committer
    /// wins). Re-locking by the same transaction also succeeds.
    pub fn try_lock_row(&self, offset: ChunkOffset, tx: TxId) -> bool {
        let tid = &self.tids[offset.as_usize()];
        tid.compare_exchange(0, tx.as_u32(), Ordering::AcqRel, Ordering::Acquire)
            .map_or_else(|current| current == tx.as_u32(), |_| true)
    }

    /// Finalizes a delete: the row stops being visible at `cid`.
    ///
    /// The owning transaction id is left in place, matching the commit
    /// protocol of the original engine. Bumps the invalid row count that
    /// gates physical chunk removal.
    pub fn commit_delete(&self, offset: ChunkOffset, cid: CommitId) {
        self.end_cids[offset.as_usize()].store(cid.as_u32(), Ordering::Release);
        self.invalid_row_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Rolls back an uncommitted delete: end commit id returns to the
    /// MAX sentinel and the row is unlocked.
    pub fn rollback_row(&self, offset: ChunkOffset) {
        self.end_cids[offset.as_usize()].store(CommitId::MAX.as_u32(), Ordering::Release);
        self.tids[offset.as_usize()].store(0, Ordering::Release);
    }

    /// Returns the owning transaction id of a row (0 = unowned).
    #[must_use]
    pub fn tid(&self, offset: ChunkOffset) -> TxId {
        TxId::new(self.tids[offset.as_usize()].load(Ordering::Acquire))
    }

    /// Returns the begin commit id of a row.
    #[must_use]
    pub fn begin_cid(&self, offset: ChunkOffset) -> CommitId {
        CommitId::new(self.begin_cids[offset.as_usize()].load(Ordering::Acquire))
    }

    /// Returns the end commit id of a row.
    #[must_use]
    pub fn end_cid(&self, offset: ChunkOffset) -> CommitId {
        CommitId::new(self.end_cids[offset.as_usize()].load(Ordering::Acquire))
    }

    /// Checks whether a row is visible to a reading transaction.
    ///
    /// A row is visible iff `begin <= snapshot < end`, with two
    /// own-transaction refinements: a transaction sees its own
    /// uncommitted inserts, and does not see rows it has itself marked
    /// for deletion.
    #[must_use]
    pub fn is_row_visible(&self, offset: ChunkOffset, snapshot: CommitId, our_tx: TxId) -> bool {
        let idx = offset.as_usize();
        let tid = self.tids[idx].load(Ordering::Acquire);
        let begin = self.begin_cids[idx].load(Ordering::Acquire);
        let end = self.end_cids[idx].load(Ordering::Acquire);

        if our_tx.is_valid() && tid == our_tx.as_u32() {
            // Our own write: an uncommitted insert is visible, a row we
            // marked for deletion is not.
            return end == CommitId::MAX.as_u32();
        }

        begin <= snapshot.as_u32() && snapshot.as_u32() < end
    }

    /// Number of rows whose deletion has been committed.
    ///
    /// A chunk may only be physically removed once this equals its row
    /// count.
    #[must_use]
    pub fn invalid_row_count(&self) -> u32 {
        self.invalid_row_count.load(Ordering::Acquire)
    }

    /// Approximate heap size of this metadata block.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + 3 * self.tids.len() * std::mem::size_of::<AtomicU32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn off(o: u32) -> ChunkOffset {
        ChunkOffset::new(o)
    }

    #[test]
    fn test_fresh_rows_invisible() {
        let mvcc = MvccData::new(4);
        assert!(!mvcc.is_row_visible(off(0), CommitId::new(100), TxId::INVALID));
    }

    #[test]
    fn test_insert_visibility_window() {
        let mvcc = MvccData::new(4);
        mvcc.register_insert(off(0), TxId::new(7));

        // Uncommitted: visible only to the inserting transaction.
        assert!(mvcc.is_row_visible(off(0), CommitId::new(1), TxId::new(7)));
        assert!(!mvcc.is_row_visible(off(0), CommitId::new(1), TxId::new(8)));

        mvcc.commit_insert(off(0), CommitId::new(5));

        // Committed at 5: visible to snapshots >= 5 only.
        assert!(!mvcc.is_row_visible(off(0), CommitId::new(4), TxId::INVALID));
        assert!(mvcc.is_row_visible(off(0), CommitId::new(5), TxId::INVALID));
        assert!(mvcc.is_row_visible(off(0), CommitId::new(9), TxId::INVALID));
    }

    #[test]
    fn test_delete_visibility_window() {
        let mvcc = MvccData::new(4);
        mvcc.register_insert(off(1), TxId::new(1));
        mvcc.commit_insert(off(1), CommitId::new(2));

        assert!(mvcc.try_lock_row(off(1), TxId::new(3)));
        mvcc.commit_delete(off(1), CommitId::new(8));

        // Visible to snapshots in [2, 8), invisible at and after 8.
        assert!(mvcc.is_row_visible(off(1), CommitId::new(7), TxId::INVALID));
        assert!(!mvcc.is_row_visible(off(1), CommitId::new(8), TxId::INVALID));
        assert_eq!(mvcc.invalid_row_count(), 1);
        // The committing transaction's id stays on the row.
        assert_eq!(mvcc.tid(off(1)), TxId::new(3));
    }

    #[test]
    fn test_first_committer_wins() {
        let mvcc = MvccData::new(2);
        mvcc.register_insert(off(0), TxId::new(1));
        mvcc.commit_insert(off(0), CommitId::new(1));

        assert!(mvcc.try_lock_row(off(0), TxId::new(5)));
        // Re-locking by the owner is fine, another transaction loses.
        assert!(mvcc.try_lock_row(off(0), TxId::new(5)));
        assert!(!mvcc.try_lock_row(off(0), TxId::new(6)));
    }

    #[test]
    fn test_rollback_restores_visibility() {
        let mvcc = MvccData::new(2);
        mvcc.register_insert(off(0), TxId::new(1));
        mvcc.commit_insert(off(0), CommitId::new(1));

        assert!(mvcc.try_lock_row(off(0), TxId::new(2)));
        mvcc.rollback_row(off(0));

        assert_eq!(mvcc.end_cid(off(0)), CommitId::MAX);
        assert_eq!(mvcc.tid(off(0)), TxId::INVALID);
        assert!(mvcc.is_row_visible(off(0), CommitId::new(9), TxId::INVALID));
        // The lock is free again.
        assert!(mvcc.try_lock_row(off(0), TxId::new(6)));
    }

    #[test]
    fn test_own_deleted_row_invisible() {
        let mvcc = MvccData::new(2);
        mvcc.register_insert(off(0), TxId::new(1));
        mvcc.commit_insert(off(0), CommitId::new(1));

        assert!(mvcc.try_lock_row(off(0), TxId::new(4)));
        mvcc.commit_delete(off(0), CommitId::new(6));

        // The deleting transaction no longer sees the row.
        assert!(!mvcc.is_row_visible(off(0), CommitId::new(5), TxId::new(4)));
    }
}
