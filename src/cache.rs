//! Streams Record Cache
//!
//! The public facade tying the components together: striped shard table,
//! per-shard segment indices, the insertion-order log, and the global byte
//! counter.
//!
//! # Read path
//!
//! ```text
//! get_records((S, seq), limit)
//!
//!   stripe(S).read() ──▶ index ──▶ floor(seq)
//!                                    │
//!              ┌─────────────────────┘
//!              ▼
//!        [100      110) ──▶ get(110) ──▶ [110   120) ──▶ get(120) ──▶ gap
//!        suffix from seq       append records          stop: return
//! ```
//!
//! The floor segment contributes its record suffix from `seq`; then the
//! chain "next segment starts exactly where this one ended" is followed,
//! appending whole segments, until the limit is reached, the chain breaks,
//! or the shard runs out of segments. The whole walk happens under one read
//! lock acquisition and mutates nothing.
//!
//! # Write path
//!
//! ```text
//! put_records((S, seq), records)
//!
//!   candidate = Segment(seq, records)
//!   stripe(S).write():
//!       lower = floor(seq).end       upper = higher(seq).start
//!       trimmed = candidate.sub_segment(lower, upper)
//!       if non-empty: index.insert + log.push + bytes += trimmed
//!   evict()   // after the lock is released
//! ```
//!
//! Trimming against both neighbours preserves the no-overlap invariant in
//! O(log n) without moving records between segments. Re-inserting an
//! exactly covered range trims to empty and is a no-op.
//!
//! # Eviction
//!
//! FIFO by insertion: pop the oldest `(shard, start)` from the log, take
//! that shard's write lock, remove the segment if it is still there, give
//! its bytes back, and repeat until the counter is within budget or the log
//! is empty. A popped identity whose segment is gone is a benign race with
//! another evictor and is skipped. Eviction of a just-inserted segment can
//! only begin after its `put` released the stripe write lock, because the
//! evictor needs that same lock.

use crate::config::StreamsRecordCacheConfig;
use crate::error::CacheError;
use crate::index::ShardIndex;
use crate::log::InsertionLog;
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::position::{SequenceNumber, ShardIteratorPosition};
use crate::record::StreamRecord;
use crate::segment::Segment;
use crate::striped::{DefaultHashBuilder, ShardTable};
use core::hash::{BuildHasher, Hash};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// A size-bounded, concurrent, in-memory cache over sharded change-data
/// streams.
///
/// The cache stores batches of sequence-numbered records as immutable
/// segments overlaying each shard and serves sequential reads by stitching
/// adjacent segments back together. It never talks to the upstream: callers
/// fetch, the cache remembers. A result shorter than requested means the
/// cached coverage ran out, not that the shard did.
///
/// # Type Parameters
///
/// - `K`: shard id type. Any hashable, equality-comparable token.
/// - `S`: hash builder dispatching shard ids onto lock stripes.
///
/// # Thread Safety
///
/// All operations take `&self`; the cache is `Send + Sync` and is shared
/// via `Arc`. Operations on one shard serialize through that shard's
/// stripe; operations on different shards run in parallel up to stripe
/// collisions.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use streamcache::{
///     SequenceNumber, ShardIteratorPosition, StreamRecord, StreamsRecordCache,
///     StreamsRecordCacheConfig,
/// };
///
/// let cache: StreamsRecordCache<String> =
///     StreamsRecordCache::init(StreamsRecordCacheConfig::new(1024 * 1024), None);
///
/// let position = ShardIteratorPosition::new("shard-0001".to_string(), SequenceNumber::from(7u64));
/// cache
///     .put_records(
///         &position,
///         vec![StreamRecord::new(SequenceNumber::from(7u64), Bytes::from_static(b"r7"))],
///     )
///     .unwrap();
///
/// let records = cache.get_records(&position, 100).unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub struct StreamsRecordCache<K, S = DefaultHashBuilder> {
    table: ShardTable<K, S>,
    log: InsertionLog<K>,
    /// Sum of upstream-reported byte sizes of all cached records. Mutated
    /// under the write lock of the shard involved; read without a lock by
    /// the evictor, which tolerates cross-shard staleness by re-checking
    /// after every removal.
    cached_bytes: AtomicU64,
    max_records_byte_size: u64,
    counters: CacheCounters,
}

impl<K> StreamsRecordCache<K, DefaultHashBuilder>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache from a configuration with an optional hasher.
    ///
    /// This is the recommended entry point. Pass `None` to use the default
    /// hash builder.
    pub fn init(config: StreamsRecordCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<K, S> StreamsRecordCache<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    /// Creates a cache with a custom hash builder.
    ///
    /// Use this for deterministic stripe dispatch or DoS-resistant hashers.
    pub fn init_with_hasher(config: StreamsRecordCacheConfig, hash_builder: S) -> Self {
        StreamsRecordCache {
            table: ShardTable::new(config.stripes, hash_builder),
            log: InsertionLog::new(),
            cached_bytes: AtomicU64::new(0),
            max_records_byte_size: config.max_records_byte_size,
            counters: CacheCounters::new(),
        }
    }

    /// Returns up to `limit` consecutive cached records starting at
    /// `position`, in strictly ascending sequence-number order.
    ///
    /// The result is empty when no cached segment contains the position. A
    /// result shorter than `limit` means the cache ran out of *adjacent*
    /// coverage — whether the shard truly has no further records is for the
    /// upstream to say. Every returned record has a sequence number
    /// `≥ position.sequence_number()`.
    ///
    /// This is a pure read: no index mutation, no eviction, no change to
    /// the byte counter.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] if `limit` is zero.
    pub fn get_records(
        &self,
        position: &ShardIteratorPosition<K>,
        limit: usize,
    ) -> Result<Vec<StreamRecord>, CacheError> {
        if limit == 0 {
            return Err(CacheError::InvalidArgument("limit must be positive"));
        }

        let guard = self.table.stripe(position.shard_id()).read();
        let Some(index) = guard.get(position.shard_id()) else {
            self.counters.record_miss();
            return Ok(Vec::new());
        };

        let seq = position.sequence_number();
        let Some(floor) = index.floor(seq) else {
            self.counters.record_miss();
            return Ok(Vec::new());
        };
        if floor.end() <= seq {
            // The floor segment lies entirely below the request.
            self.counters.record_miss();
            return Ok(Vec::new());
        }

        let mut collected = Vec::new();
        let mut bytes = 0u64;
        for record in floor.records_from(seq) {
            if collected.len() == limit {
                break;
            }
            bytes += record.byte_size();
            collected.push(record.clone());
        }

        // Stitch: follow segments that start exactly where the previous one
        // ended. A gap or the end of the shard's coverage stops the walk.
        let mut cursor = floor.end();
        while collected.len() < limit {
            let Some(next) = index.get(cursor) else {
                break;
            };
            for record in next.records() {
                if collected.len() == limit {
                    break;
                }
                bytes += record.byte_size();
                collected.push(record.clone());
            }
            cursor = next.end();
        }

        if collected.is_empty() {
            self.counters.record_miss();
        } else {
            self.counters.record_hit(collected.len() as u64, bytes);
        }
        Ok(collected)
    }

    /// Caches `records` as a segment of `position`'s shard starting at
    /// `position.sequence_number()`.
    ///
    /// The caller asserts that the records are what the shard contains from
    /// that position onward. The candidate segment is trimmed against its
    /// cached neighbours so the shard's segments never overlap; records
    /// falling inside already-cached ranges are dropped. Re-inserting an
    /// exactly covered range is a no-op. If the insert pushes the cache
    /// over its byte budget, FIFO eviction runs before the call returns.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] if `records` is empty.
    ///
    /// # Panics
    ///
    /// Panics if `records` is not strictly ascending by sequence number or
    /// contains a record before `position.sequence_number()` — the batch
    /// contract is the caller's to uphold, and silently caching a corrupt
    /// segment would poison later reads.
    pub fn put_records(
        &self,
        position: &ShardIteratorPosition<K>,
        records: Vec<StreamRecord>,
    ) -> Result<(), CacheError> {
        if records.is_empty() {
            return Err(CacheError::InvalidArgument("records must be non-empty"));
        }
        let candidate = Segment::new(position.sequence_number().clone(), records);

        {
            let mut guard = self.table.stripe(position.shard_id()).write();
            let index = guard
                .entry(position.shard_id().clone())
                .or_insert_with(ShardIndex::new);

            let start = candidate.start();
            let lower = index.floor(start).map(|segment| segment.end().clone());
            let upper = index.higher(start).map(|segment| segment.start().clone());
            let trimmed = candidate.sub_segment(lower.as_ref(), upper.as_ref());

            if trimmed.is_empty() {
                // Only cached neighbours can trim a candidate to nothing,
                // so the index is non-empty here and stays resident.
                trace!("put fully covered by cached neighbours; nothing inserted");
                self.counters.record_trimmed_empty();
            } else {
                trace!(
                    start = %trimmed.start(),
                    end = %trimmed.end(),
                    bytes = trimmed.byte_size(),
                    "segment inserted"
                );
                self.counters.record_insertion(trimmed.byte_size());
                self.cached_bytes
                    .fetch_add(trimmed.byte_size(), Ordering::Relaxed);
                self.log
                    .push(position.shard_id().clone(), trimmed.start().clone());
                index.insert(trimmed);
            }
        }

        self.evict();
        Ok(())
    }

    /// FIFO eviction loop: runs until the cached byte total is within
    /// budget or the insertion log is empty (another thread evicted
    /// concurrently; the next `put` re-checks).
    fn evict(&self) {
        while self.cached_bytes.load(Ordering::Relaxed) > self.max_records_byte_size {
            let Some((shard_id, start)) = self.log.pop() else {
                break;
            };

            let mut guard = self.table.stripe(&shard_id).write();
            let Some(index) = guard.get_mut(&shard_id) else {
                // Emptied-shard cleanup won a race with this pop entry.
                continue;
            };
            if let Some(segment) = index.remove(&start) {
                trace!(start = %start, bytes = segment.byte_size(), "segment evicted");
                self.cached_bytes
                    .fetch_sub(segment.byte_size(), Ordering::Relaxed);
                self.counters.record_eviction(segment.byte_size());
                if index.is_empty() {
                    guard.remove(&shard_id);
                }
            }
            // A missing segment is a benign race with a concurrent evictor;
            // the pop consumed the stale identity and the loop re-checks.
        }
    }

    /// Current sum of upstream-reported byte sizes of all cached records.
    ///
    /// May be momentarily stale relative to in-flight operations on other
    /// shards.
    pub fn cached_byte_size(&self) -> u64 {
        self.cached_bytes.load(Ordering::Relaxed)
    }

    /// The configured byte budget.
    pub fn max_records_byte_size(&self) -> u64 {
        self.max_records_byte_size
    }

    /// The number of lock stripes shard ids hash onto.
    pub fn stripe_count(&self) -> usize {
        self.table.stripe_count()
    }

    /// Total number of cached segments across all shards.
    ///
    /// Locks each stripe in turn; the value may be slightly stale under
    /// concurrent traffic.
    pub fn segment_count(&self) -> usize {
        self.table
            .stripes()
            .map(|stripe| {
                stripe
                    .read()
                    .values()
                    .map(ShardIndex::len)
                    .sum::<usize>()
            })
            .sum()
    }

    /// `true` if no shard has cached segments.
    pub fn is_empty(&self) -> bool {
        self.table.stripes().all(|stripe| stripe.read().is_empty())
    }

    /// The `[start, end)` spans cached for `shard_id`, in ascending order.
    ///
    /// Diagnostic view: invariant checks in tests and operators inspecting
    /// fragmentation use this; the spans of distinct segments never
    /// overlap.
    pub fn segment_spans(&self, shard_id: &K) -> Vec<(SequenceNumber, SequenceNumber)> {
        let guard = self.table.stripe(shard_id).read();
        guard
            .get(shard_id)
            .map(|index| {
                index
                    .iter()
                    .map(|segment| (segment.start().clone(), segment.end().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Counter access for callers that export metrics.
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }
}

impl<K, S> CacheMetrics for StreamsRecordCache<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.counters.snapshot();
        let cached = self.cached_byte_size();
        metrics.insert("cached_bytes".to_string(), cached as f64);
        metrics.insert(
            "max_records_byte_size".to_string(),
            self.max_records_byte_size as f64,
        );
        metrics.insert("segments".to_string(), self.segment_count() as f64);
        let utilization = if self.max_records_byte_size > 0 {
            cached as f64 / self.max_records_byte_size as f64
        } else {
            0.0
        };
        metrics.insert("utilization".to_string(), utilization);
        metrics
    }

    fn policy_name(&self) -> &'static str {
        "FIFO"
    }
}

impl<K, S> core::fmt::Debug for StreamsRecordCache<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamsRecordCache")
            .field("stripe_count", &self.table.stripe_count())
            .field("cached_bytes", &self.cached_byte_size())
            .field("max_records_byte_size", &self.max_records_byte_size)
            .finish()
    }
}
