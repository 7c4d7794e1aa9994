//! Error Types
//!
//! The cache has no I/O, so its failure surface is small: callers can hand
//! it malformed arguments, and sequence numbers parsed from upstream
//! transport strings can be garbage. Both are reported through
//! [`CacheError`] before any state is mutated.
//!
//! Broken internal invariants (overlapping segments, unsorted records) are
//! **not** represented here: they are programmer errors, detected by
//! assertions that panic at the point of corruption rather than letting a
//! bad segment propagate into an index. Allocator exhaustion likewise
//! propagates as-is; the cache holds no resources needing manual release
//! beyond lock guards that unwind with scope.

use num_bigint::ParseBigIntError;
use thiserror::Error;

/// Errors surfaced to callers of the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A caller-supplied argument violated the operation's contract
    /// (zero `limit`, empty record batch). The cache state is unchanged.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A sequence number string was not a non-negative decimal integer.
    #[error("invalid sequence number: {0}")]
    InvalidSequenceNumber(#[from] ParseBigIntError),
}
