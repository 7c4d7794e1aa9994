//! Cache Metrics
//!
//! Lock-free counters plus a reporting trait. The read path holds only a
//! shard read lock, so every counter is an atomic updated with relaxed
//! ordering — the numbers are observability, not synchronization, and a
//! momentarily torn view across counters is acceptable in exchange for a
//! zero-contention hot path.
//!
//! Snapshots are returned as a `BTreeMap` rather than a hash map so metric
//! keys always appear in a deterministic order: scrape output, logs, and
//! test assertions stay reproducible.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for one cache instance.
///
/// All recording methods take `&self` and are safe to call concurrently
/// from readers, writers, and evictors.
#[derive(Debug, Default)]
pub struct CacheCounters {
    /// `get_records` calls observed.
    requests: AtomicU64,
    /// `get_records` calls that returned at least one record.
    hits: AtomicU64,
    /// Records returned across all hits.
    records_served: AtomicU64,
    /// Upstream-reported bytes returned across all hits.
    bytes_served: AtomicU64,
    /// Segments that survived trimming and entered an index.
    segments_inserted: AtomicU64,
    /// Upstream-reported bytes those segments carried.
    bytes_inserted: AtomicU64,
    /// `put_records` calls whose candidate was trimmed to nothing.
    puts_trimmed_empty: AtomicU64,
    /// Segments removed by the evictor.
    evictions: AtomicU64,
    /// Upstream-reported bytes those evictions released.
    bytes_evicted: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn new() -> Self {
        CacheCounters::default()
    }

    pub(crate) fn record_hit(&self, records: u64, bytes: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.records_served.fetch_add(records, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insertion(&self, bytes: u64) {
        self.segments_inserted.fetch_add(1, Ordering::Relaxed);
        self.bytes_inserted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_trimmed_empty(&self) {
        self.puts_trimmed_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, bytes: u64) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.bytes_evicted.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Total `get_records` calls observed.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// `get_records` calls that returned at least one record.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Segments removed by the evictor.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Fraction of requests that returned at least one record, or 0.0
    /// before any request.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.requests();
        if requests > 0 {
            self.hits() as f64 / requests as f64
        } else {
            0.0
        }
    }

    /// All counters and derived rates, keys in deterministic order.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let requests = self.requests();
        let hits = self.hits();

        let mut metrics = BTreeMap::new();
        metrics.insert("bytes_evicted".to_string(), self.bytes_evicted.load(Ordering::Relaxed) as f64);
        metrics.insert("bytes_inserted".to_string(), self.bytes_inserted.load(Ordering::Relaxed) as f64);
        metrics.insert("bytes_served".to_string(), self.bytes_served.load(Ordering::Relaxed) as f64);
        metrics.insert("evictions".to_string(), self.evictions() as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("hits".to_string(), hits as f64);
        metrics.insert("misses".to_string(), (requests - hits) as f64);
        metrics.insert(
            "puts_trimmed_empty".to_string(),
            self.puts_trimmed_empty.load(Ordering::Relaxed) as f64,
        );
        metrics.insert(
            "records_served".to_string(),
            self.records_served.load(Ordering::Relaxed) as f64,
        );
        metrics.insert("requests".to_string(), requests as f64);
        metrics.insert(
            "segments_inserted".to_string(),
            self.segments_inserted.load(Ordering::Relaxed) as f64,
        );
        metrics
    }
}

/// Uniform metrics reporting for cache instances.
///
/// Implementations fold instance-level gauges (cached bytes, segment count,
/// utilization) into the counter snapshot.
pub trait CacheMetrics {
    /// All metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Name of the eviction policy, for identification in aggregated
    /// output.
    fn policy_name(&self) -> &'static str;
}
