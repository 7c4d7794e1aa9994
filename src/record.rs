//! Stream Records
//!
//! A [`StreamRecord`] is the unit the cache stores and serves: an opaque
//! payload tagged with its shard-local [`SequenceNumber`] and its
//! **upstream-reported byte size**.
//!
//! # Two sizes, one of which matters
//!
//! The byte size carried here is the size the upstream stream API reported
//! for the record, not the size of the in-memory representation. The cache's
//! byte budget ([`StreamsRecordCacheConfig::max_records_byte_size`]) is
//! interpreted in the same units, so accounting stays meaningful to the
//! operator who set the limit against upstream billing and throughput
//! numbers. [`StreamRecord::new`] defaults the reported size to the payload
//! length, which is correct whenever the payload is stored verbatim.
//!
//! [`StreamsRecordCacheConfig::max_records_byte_size`]: crate::StreamsRecordCacheConfig
//!
//! # Cheap clones
//!
//! Payloads are [`bytes::Bytes`], so cloning a record bumps a reference
//! count rather than copying the payload. Reads return cloned records
//! collected under a read lock; the clones stay valid after the segment that
//! produced them is evicted.

use crate::position::SequenceNumber;
use bytes::Bytes;
use core::fmt;

/// An opaque, sized, sequence-numbered stream record.
///
/// Records are immutable once constructed. Equality is structural over the
/// sequence number, payload, and reported size.
#[derive(Clone, PartialEq, Eq)]
pub struct StreamRecord {
    sequence_number: SequenceNumber,
    data: Bytes,
    byte_size: u64,
}

impl StreamRecord {
    /// Creates a record whose reported byte size is the payload length.
    pub fn new(sequence_number: SequenceNumber, data: Bytes) -> Self {
        let byte_size = data.len() as u64;
        StreamRecord {
            sequence_number,
            data,
            byte_size,
        }
    }

    /// Creates a record with an explicit upstream-reported byte size.
    ///
    /// Use this when the upstream's size accounting differs from the stored
    /// payload (compressed payloads, protocol framing overhead, and so on).
    pub fn with_reported_size(
        sequence_number: SequenceNumber,
        data: Bytes,
        byte_size: u64,
    ) -> Self {
        StreamRecord {
            sequence_number,
            data,
            byte_size,
        }
    }

    /// The record's position within its shard.
    pub fn sequence_number(&self) -> &SequenceNumber {
        &self.sequence_number
    }

    /// The opaque payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The upstream-reported byte size used for budget accounting.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

impl fmt::Debug for StreamRecord {
    // Payloads are opaque and potentially large; show position and size only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamRecord")
            .field("sequence_number", &self.sequence_number)
            .field("byte_size", &self.byte_size)
            .finish()
    }
}
