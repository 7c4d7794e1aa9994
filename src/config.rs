//! Cache Configuration
//!
//! The configuration struct is the single construction entry point for the
//! cache: required parameters are explicit fields, optional tuning comes
//! with defaults via [`StreamsRecordCacheConfig::new`].
//!
//! # Sizing
//!
//! `max_records_byte_size` bounds **upstream-reported** record bytes, not
//! process memory. Per-record in-memory overhead (sequence numbers, segment
//! and index bookkeeping) comes on top, so size the budget from the same
//! upstream accounting you use for throughput and billing, then leave
//! headroom.
//!
//! # Examples
//!
//! ```
//! use streamcache::config::{StreamsRecordCacheConfig, DEFAULT_STRIPE_COUNT};
//!
//! // Default stripe pool, 64 MiB byte budget.
//! let config = StreamsRecordCacheConfig::new(64 * 1024 * 1024);
//! assert_eq!(config.stripes, DEFAULT_STRIPE_COUNT);
//!
//! // Explicit stripe pool for tests that want deterministic contention.
//! let config = StreamsRecordCacheConfig {
//!     max_records_byte_size: 1024,
//!     stripes: 4,
//! };
//! assert_eq!(config.stripes, 4);
//! ```

/// Default number of lock stripes.
///
/// Contention across unrelated shards is rare and a stripe collision only
/// costs wait time, so a pool on the order of a thousand keeps the collision
/// probability negligible at a fixed footprint.
pub const DEFAULT_STRIPE_COUNT: usize = 1024;

/// Configuration for a [`StreamsRecordCache`](crate::StreamsRecordCache).
#[derive(Clone, Copy, Debug)]
pub struct StreamsRecordCacheConfig {
    /// Upper bound on the sum of upstream-reported byte sizes of all cached
    /// records. When an insert pushes the total above this bound, FIFO
    /// eviction runs until the total is back within it.
    pub max_records_byte_size: u64,

    /// Number of reader/writer lock stripes shard ids hash onto. Clamped to
    /// at least one.
    pub stripes: usize,
}

impl StreamsRecordCacheConfig {
    /// Creates a configuration with the given byte budget and the default
    /// stripe count.
    pub fn new(max_records_byte_size: u64) -> Self {
        StreamsRecordCacheConfig {
            max_records_byte_size,
            stripes: DEFAULT_STRIPE_COUNT,
        }
    }
}
