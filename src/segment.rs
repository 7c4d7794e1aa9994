//! Cached Stream Segments
//!
//! A [`Segment`] is an immutable half-open interval `[start, end)` of one
//! shard's sequence-number space, together with the records whose sequence
//! numbers fall inside it. Segments are the unit of caching: they are built
//! once at insert time, trimmed against their neighbours, and either live in
//! a shard index until evicted or are discarded immediately.
//!
//! ```text
//!            start                                  end (exclusive)
//!              │                                     │
//!   ───────────┼──●────●─────────●───●──────●────────┼───────────▶ seq
//!              │ r₀    r₁        r₂  r₃     r₄       │
//!              ╰──────────── Segment ────────────────╯
//! ```
//!
//! # Invariants
//!
//! Enforced at construction; a violation is a programmer error and panics
//! rather than propagating a corrupt segment into an index:
//!
//! 1. `start ≤ end`; `start == end` is the canonical empty segment.
//! 2. Records are sorted strictly ascending by sequence number.
//! 3. Every record's sequence number lies in `[start, end)`.
//! 4. The byte size is the sum of the records' upstream-reported sizes.
//! 5. A segment with no records has `start == end` (an empty interval), so
//!    [`is_empty`](Segment::is_empty) is equivalent to "no records, zero
//!    bytes".
//!
//! Segments are never mutated. "Modification" means deriving a new segment
//! via [`sub_segment`](Segment::sub_segment).

use crate::position::SequenceNumber;
use crate::record::StreamRecord;
use core::cmp;
use core::fmt;

/// An immutable half-open interval of one shard plus its cached records.
///
/// See the [module documentation](self) for the invariants.
#[derive(Clone, PartialEq, Eq)]
pub struct Segment {
    start: SequenceNumber,
    end: SequenceNumber,
    records: Vec<StreamRecord>,
    byte_size: u64,
}

impl Segment {
    /// Creates a segment starting at `start` whose end is one past the last
    /// record's sequence number.
    ///
    /// # Panics
    ///
    /// Panics if `records` is empty (use [`Segment::with_end`] for the
    /// general half-open form), if the records are not strictly ascending,
    /// or if any record precedes `start`.
    pub fn new(start: SequenceNumber, records: Vec<StreamRecord>) -> Self {
        let last = records
            .last()
            .expect("segment records must be non-empty; use with_end for empty intervals");
        let end = last.sequence_number().next();
        Segment::with_end(start, end, records)
    }

    /// Creates a segment over the half-open interval `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if any construction invariant is violated: `start > end`,
    /// records not strictly ascending, a record outside `[start, end)`, or a
    /// non-empty interval with no records.
    pub fn with_end(start: SequenceNumber, end: SequenceNumber, records: Vec<StreamRecord>) -> Self {
        assert!(start <= end, "segment start {start} exceeds end {end}");
        if records.is_empty() {
            assert!(
                start == end,
                "recordless segment must have an empty interval, got [{start}, {end})"
            );
        } else {
            let mut previous: Option<&SequenceNumber> = None;
            for record in &records {
                let seq = record.sequence_number();
                assert!(
                    *seq >= start && *seq < end,
                    "record {seq} outside segment interval [{start}, {end})"
                );
                if let Some(prev) = previous {
                    assert!(
                        prev < seq,
                        "records not strictly ascending: {prev} then {seq}"
                    );
                }
                previous = Some(seq);
            }
        }
        let byte_size = records.iter().map(StreamRecord::byte_size).sum();
        Segment {
            start,
            end,
            records,
            byte_size,
        }
    }

    /// The canonical empty segment anchored at `at`.
    fn empty_at(at: SequenceNumber) -> Self {
        Segment {
            start: at.clone(),
            end: at,
            records: Vec::new(),
            byte_size: 0,
        }
    }

    /// Inclusive lower bound of the interval.
    pub fn start(&self) -> &SequenceNumber {
        &self.start
    }

    /// Exclusive upper bound of the interval.
    pub fn end(&self) -> &SequenceNumber {
        &self.end
    }

    /// The records in the interval, sorted strictly ascending.
    pub fn records(&self) -> &[StreamRecord] {
        &self.records
    }

    /// Sum of the upstream-reported byte sizes of the records.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// `true` iff the interval is empty (`start == end`), equivalently iff
    /// the segment holds no records.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the suffix of records with sequence numbers `≥ seq`.
    ///
    /// Runs a binary search, O(log n); an exact match resolves to its own
    /// index so the matching record is included.
    ///
    /// # Panics
    ///
    /// Panics unless `start ≤ seq < end`. Callers locate the segment via a
    /// floor lookup first, which establishes the precondition.
    pub fn records_from(&self, seq: &SequenceNumber) -> &[StreamRecord] {
        assert!(
            *seq >= self.start && *seq < self.end,
            "sequence number {seq} outside segment interval [{}, {})",
            self.start,
            self.end
        );
        let idx = self
            .records
            .partition_point(|record| record.sequence_number() < seq);
        &self.records[idx..]
    }

    /// Returns this segment clipped to its intersection with `[from, to)`.
    ///
    /// An absent bound leaves that side unclipped; with both bounds absent
    /// the result is a copy of the original. The result's records are
    /// precisely those of the original with sequence numbers in the clipped
    /// interval. Clipping never widens the segment. If nothing survives the
    /// clip, the result [`is_empty`](Segment::is_empty) — callers must not
    /// insert it into an index.
    ///
    /// # Panics
    ///
    /// Panics if both bounds are present and `from > to`.
    pub fn sub_segment(
        &self,
        from: Option<&SequenceNumber>,
        to: Option<&SequenceNumber>,
    ) -> Segment {
        if let (Some(f), Some(t)) = (from, to) {
            assert!(f <= t, "sub_segment bounds inverted: from {f} > to {t}");
        }
        let start = cmp::max(&self.start, from.unwrap_or(&self.start));
        let end = cmp::min(&self.end, to.unwrap_or(&self.end));
        if start >= end {
            return Segment::empty_at(start.clone());
        }
        let lo = self
            .records
            .partition_point(|record| record.sequence_number() < start);
        let hi = self
            .records
            .partition_point(|record| record.sequence_number() < end);
        if lo == hi {
            // The clipped interval is non-degenerate but holds no records;
            // collapse to empty so "no records" and "empty interval" stay
            // equivalent.
            return Segment::empty_at(start.clone());
        }
        let records = self.records[lo..hi].to_vec();
        let byte_size = records.iter().map(StreamRecord::byte_size).sum();
        Segment {
            start: start.clone(),
            end: end.clone(),
            records,
            byte_size,
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("records", &self.records.len())
            .field("byte_size", &self.byte_size)
            .finish()
    }
}
