//! Insertion-Order Log
//!
//! A lock-free FIFO of `(shard id, segment start)` pairs recording every
//! segment currently in the cache, in strict insertion order. The evictor
//! pops from the front to choose victims, so eviction is FIFO by insertion
//! rather than LRU — sequential scanners that revisit old positions are
//! rare, and FIFO needs no per-access bookkeeping.
//!
//! Producers push while holding their shard's write lock; evictors pop
//! without any lock. A popped entry may name a segment that no longer
//! exists (its shard index was dropped in an emptied-shard cleanup, or a
//! concurrent evictor won the race); consumers treat that as a skip, not an
//! error.

use crate::position::SequenceNumber;
use core::fmt;
use crossbeam_queue::SegQueue;

/// Lock-free MPMC FIFO of segment identities, oldest first.
pub(crate) struct InsertionLog<K> {
    entries: SegQueue<(K, SequenceNumber)>,
}

impl<K> InsertionLog<K> {
    pub(crate) fn new() -> Self {
        InsertionLog {
            entries: SegQueue::new(),
        }
    }

    /// Appends the identity of a freshly inserted segment.
    pub(crate) fn push(&self, shard_id: K, start: SequenceNumber) {
        self.entries.push((shard_id, start));
    }

    /// Removes and returns the oldest entry, or `None` when the log is
    /// empty.
    pub(crate) fn pop(&self) -> Option<(K, SequenceNumber)> {
        self.entries.pop()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K> fmt::Debug for InsertionLog<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertionLog")
            .field("len", &self.entries.len())
            .finish()
    }
}
