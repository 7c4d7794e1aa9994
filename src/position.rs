//! Stream Positions
//!
//! This module provides the two addressing types of the cache:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SequenceNumber`] | A non-negative, arbitrary-precision position within one shard |
//! | [`ShardIteratorPosition`] | A (shard id, sequence number) pair identifying a point in the keyspace |
//!
//! # Why arbitrary precision?
//!
//! Upstream stream APIs hand out sequence numbers as decimal strings with no
//! documented width. Treating them as `u64` works right up until it doesn't;
//! the cache therefore keeps them as big-integers and only ever compares,
//! hashes, and increments them.
//!
//! # Examples
//!
//! ```
//! use streamcache::SequenceNumber;
//!
//! let a = SequenceNumber::from(41u64);
//! let b: SequenceNumber = "42".parse().unwrap();
//! assert_eq!(a.next(), b);
//! assert!(a < b);
//!
//! // Values wider than any machine integer round-trip through parsing.
//! let wide: SequenceNumber = "340282366920938463463374607431768211456".parse().unwrap();
//! assert_eq!(wide.to_string(), "340282366920938463463374607431768211456");
//! ```

use crate::error::CacheError;
use crate::record::StreamRecord;
use core::fmt;
use core::str::FromStr;
use num_bigint::BigUint;

/// A non-negative, totally ordered position within one shard's stream.
///
/// Sequence numbers are arbitrary-precision: they may exceed any fixed-width
/// machine integer. They are cheap to compare and hash, and support the one
/// arithmetic operation the cache needs, [`next`](Self::next).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(BigUint);

impl SequenceNumber {
    /// Creates a sequence number from an arbitrary-precision value.
    pub fn new(value: BigUint) -> Self {
        SequenceNumber(value)
    }

    /// Returns the successor position, `self + 1`.
    ///
    /// Used to compute the exclusive end of a segment from its last record
    /// and to resume iteration after a record
    /// (see [`ShardIteratorPosition::after`]).
    pub fn next(&self) -> Self {
        SequenceNumber(&self.0 + 1u32)
    }

    /// Returns the underlying big-integer value.
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        SequenceNumber(BigUint::from(value))
    }
}

impl From<BigUint> for SequenceNumber {
    fn from(value: BigUint) -> Self {
        SequenceNumber(value)
    }
}

impl FromStr for SequenceNumber {
    type Err = CacheError;

    /// Parses a decimal string, the transport encoding used by upstream
    /// stream APIs. Signs, whitespace, and non-decimal digits are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SequenceNumber(BigUint::from_str(s)?))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceNumber({})", self.0)
    }
}

/// A point in the keyspace: a shard id plus a sequence number within that
/// shard.
///
/// `K` is the caller's shard id type — any hashable, equality-comparable
/// token. The cache never inspects it beyond hashing and equality.
///
/// # Examples
///
/// ```
/// use streamcache::{SequenceNumber, ShardIteratorPosition};
///
/// let position = ShardIteratorPosition::new("shard-0001", SequenceNumber::from(100u64));
/// assert_eq!(*position.shard_id(), "shard-0001");
/// assert_eq!(*position.sequence_number(), SequenceNumber::from(100u64));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ShardIteratorPosition<K> {
    shard_id: K,
    sequence_number: SequenceNumber,
}

impl<K> ShardIteratorPosition<K> {
    /// Creates a position at `sequence_number` within `shard_id`.
    pub fn new(shard_id: K, sequence_number: SequenceNumber) -> Self {
        ShardIteratorPosition {
            shard_id,
            sequence_number,
        }
    }

    /// The shard this position addresses.
    pub fn shard_id(&self) -> &K {
        &self.shard_id
    }

    /// The sequence number within the shard.
    pub fn sequence_number(&self) -> &SequenceNumber {
        &self.sequence_number
    }
}

impl<K: Clone> ShardIteratorPosition<K> {
    /// Returns the position immediately after `record` in the same shard:
    /// the record's sequence number plus one.
    ///
    /// This is how a consumer resumes iteration after processing a batch.
    pub fn after(&self, record: &StreamRecord) -> Self {
        ShardIteratorPosition {
            shard_id: self.shard_id.clone(),
            sequence_number: record.sequence_number().next(),
        }
    }
}
