#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Core Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | [`StreamsRecordCache::get_records`] | Up to `limit` consecutive cached records from a position, stitched across adjacent segments |
//! | [`StreamsRecordCache::put_records`] | Cache a fetched batch; trimmed against neighbours, may trigger FIFO eviction |
//!
//! ## Semantics at a Glance
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     StreamsRecordCache                              │
//! │                                                                     │
//! │  hash(shard) % stripes ──▶ RwLock stripe ──▶ shard ▶ ShardIndex     │
//! │                                                                     │
//! │  ShardIndex: start ──▶ Segment (ordered, non-overlapping)           │
//! │                                                                     │
//! │  InsertionLog: lock-free FIFO of (shard, start)  ──▶ evictor        │
//! │  cached_bytes: AtomicU64                         ──▶ byte budget    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - A **read** takes one stripe read lock, walks the floor segment and its
//!   exactly-adjacent successors, and returns cloned records. Shorter than
//!   `limit` means the adjacent coverage ran out; only the upstream knows
//!   whether the shard did.
//! - A **write** takes one stripe write lock, trims the candidate against
//!   its neighbours (never merges), and inserts what survives. Then the
//!   evictor pops insertion-order victims until the byte budget holds.
//! - **Per shard**, reads and writes linearize through the stripe lock.
//!   Across shards there is no ordering; the byte counter converges.
//!
//! ## Choosing a Byte Budget
//!
//! Sizes are **upstream-reported** record sizes, so the budget lines up
//! with the accounting you already do against the upstream's limits and
//! billing, not with process RSS. See
//! [`StreamsRecordCacheConfig`](config::StreamsRecordCacheConfig).

/// Stream positions: arbitrary-precision sequence numbers and the
/// (shard, sequence number) iterator position.
pub mod position;

/// Stream records: opaque payloads with a sequence number and an
/// upstream-reported byte size.
pub mod record;

/// Immutable cached segments: half-open intervals of a shard plus their
/// records, with suffix lookup and clipping.
pub mod segment;

/// Per-shard ordered segment index with floor/higher/exact navigation.
///
/// Internal infrastructure: owned by lock stripes, mutated only by the
/// facade.
pub(crate) mod index;

/// Striped shard lock table: a fixed pool of reader/writer locks the shard
/// id space hashes onto.
pub(crate) mod striped;

/// Lock-free insertion-order log driving FIFO eviction.
pub(crate) mod log;

/// Cache configuration.
pub mod config;

/// Error types surfaced to callers.
pub mod error;

/// Lock-free cache metrics and the reporting trait.
pub mod metrics;

/// The cache facade: `get_records`, `put_records`, and the eviction loop.
pub mod cache;

// Re-export the public surface at the crate root.
pub use cache::StreamsRecordCache;
pub use config::StreamsRecordCacheConfig;
pub use error::CacheError;
pub use metrics::{CacheCounters, CacheMetrics};
pub use position::{SequenceNumber, ShardIteratorPosition};
pub use record::StreamRecord;
pub use segment::Segment;
