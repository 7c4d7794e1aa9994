//! Streams Record Cache Benchmarks
//!
//! Measures the hot paths: single-segment reads, stitched reads across many
//! small segments, inserts that trim against neighbours, and contended
//! multi-threaded throughput.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use streamcache::{
    SequenceNumber, ShardIteratorPosition, StreamRecord, StreamsRecordCache,
    StreamsRecordCacheConfig,
};

const PAYLOAD: &[u8] = &[0u8; 256];

fn make_cache(stripes: usize) -> StreamsRecordCache<String> {
    StreamsRecordCache::init(
        StreamsRecordCacheConfig {
            max_records_byte_size: u64::MAX,
            stripes,
        },
        None,
    )
}

fn batch(start: u64, len: u64) -> Vec<StreamRecord> {
    (start..start + len)
        .map(|n| StreamRecord::new(SequenceNumber::from(n), Bytes::from_static(PAYLOAD)))
        .collect()
}

fn at(shard: &str, n: u64) -> ShardIteratorPosition<String> {
    ShardIteratorPosition::new(shard.to_string(), SequenceNumber::from(n))
}

fn bench_single_segment_get(c: &mut Criterion) {
    let cache = make_cache(1024);
    cache.put_records(&at("s", 0), batch(0, 1000)).unwrap();

    let mut group = c.benchmark_group("get_single_segment");
    for limit in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(limit as u64));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| black_box(cache.get_records(&at("s", 0), limit).unwrap()));
        });
    }
    group.finish();
}

fn bench_stitched_get(c: &mut Criterion) {
    // 100 adjacent segments of 10 records each.
    let cache = make_cache(1024);
    for i in 0..100u64 {
        cache.put_records(&at("s", i * 10), batch(i * 10, 10)).unwrap();
    }

    let mut group = c.benchmark_group("get_stitched");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("100_segments", |b| {
        b.iter(|| black_box(cache.get_records(&at("s", 0), 1000).unwrap()));
    });
    group.finish();
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(100));

    group.bench_function("fresh_shard", |b| {
        let mut shard = 0u64;
        let cache = make_cache(1024);
        b.iter(|| {
            shard += 1;
            let key = format!("shard-{shard}");
            cache
                .put_records(
                    &ShardIteratorPosition::new(key, SequenceNumber::from(0u64)),
                    batch(0, 100),
                )
                .unwrap();
        });
    });

    group.bench_function("fully_overlapping", |b| {
        let cache = make_cache(1024);
        cache.put_records(&at("s", 0), batch(0, 100)).unwrap();
        // Every iteration trims to empty against the resident segment.
        b.iter(|| cache.put_records(&at("s", 0), batch(0, 100)).unwrap());
    });

    group.finish();
}

fn bench_contended_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.throughput(Throughput::Elements(4 * 100));

    group.bench_function("4_threads_disjoint_shards", |b| {
        b.iter(|| {
            let cache = Arc::new(make_cache(1024));
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        let shard = format!("shard-{t}");
                        for i in 0..100u64 {
                            cache
                                .put_records(&at(&shard, i * 4), batch(i * 4, 4))
                                .unwrap();
                            let _ = cache.get_records(&at(&shard, i * 4), 4).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_segment_get,
    bench_stitched_get,
    bench_put,
    bench_contended_throughput
);
criterion_main!(benches);
