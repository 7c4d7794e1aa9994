//! Striped Shard Lock Table
//!
//! Shard cardinality is unbounded, so the cache does not keep one lock per
//! shard. Instead a fixed pool of reader/writer locks is allocated up front
//! and every shard id hashes onto one **stripe**:
//!
//! ```text
//!  hash(shard id) % N ──▶ stripe selection
//!
//!  ┌────────────────┐ ┌────────────────┐     ┌────────────────┐
//!  │   Stripe 0     │ │   Stripe 1     │ ... │   Stripe N-1   │
//!  │  ┌──────────┐  │ │  ┌──────────┐  │     │  ┌──────────┐  │
//!  │  │  RwLock  │  │ │  │  RwLock  │  │     │  │  RwLock  │  │
//!  │  └────┬─────┘  │ │  └────┬─────┘  │     │  └────┬─────┘  │
//!  │       ▼        │ │       ▼        │     │       ▼        │
//!  │ shard ▶ index  │ │ shard ▶ index  │     │ shard ▶ index  │
//!  └────────────────┘ └────────────────┘     └────────────────┘
//! ```
//!
//! The map from shard id to [`ShardIndex`] lives *inside* the stripe, so one
//! lock acquisition simultaneously guards index creation, removal, and
//! mutation for every shard hashed to that stripe. Two lookups of the same
//! shard id always reach the same lock because the hash builder is fixed at
//! construction.
//!
//! Striping trades a little false sharing for a bounded footprint: unrelated
//! shards that collide on a stripe wait on each other, which costs latency
//! but never correctness. The default pool of 1024 stripes makes collisions
//! rare at realistic shard counts.

use crate::index::ShardIndex;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::RwLock;

#[cfg(feature = "hashbrown")]
pub(crate) use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
pub(crate) use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// The shard-to-index map guarded by one stripe lock.
pub(crate) type Stripe<K, S> = HashMap<K, ShardIndex, S>;

/// Fixed pool of reader/writer locks, each guarding the shard indices
/// hashed to it.
pub(crate) struct ShardTable<K, S = DefaultHashBuilder> {
    stripes: Box<[RwLock<Stripe<K, S>>]>,
    hash_builder: S,
}

impl<K, S> ShardTable<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates a table with `stripe_count` stripes (at least one), cloning
    /// `hash_builder` into each stripe's map so shard-to-stripe dispatch and
    /// in-stripe lookup hash identically.
    pub(crate) fn new(stripe_count: usize, hash_builder: S) -> Self {
        let stripes: Vec<_> = (0..stripe_count.max(1))
            .map(|_| RwLock::new(HashMap::with_hasher(hash_builder.clone())))
            .collect();
        ShardTable {
            stripes: stripes.into_boxed_slice(),
            hash_builder,
        }
    }

    /// The stripe lock for `shard_id`. Stable: the same id always maps to
    /// the same lock.
    #[inline]
    pub(crate) fn stripe<Q>(&self, shard_id: &Q) -> &RwLock<Stripe<K, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let idx = (self.hash_builder.hash_one(shard_id) as usize) % self.stripes.len();
        &self.stripes[idx]
    }

    pub(crate) fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// All stripes, for aggregate reads that lock each in turn.
    pub(crate) fn stripes(&self) -> impl Iterator<Item = &RwLock<Stripe<K, S>>> {
        self.stripes.iter()
    }
}

impl<K, S> fmt::Debug for ShardTable<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardTable")
            .field("stripe_count", &self.stripes.len())
            .finish()
    }
}
