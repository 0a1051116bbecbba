//! Single-resolution ring buffer: component B of the design.
//!
//! A `Ring<V, Pol>` owns one circular buffer of fixed capacity and bucket
//! width. It accepts timestamped opaque payloads, advances its head/tail
//! across gaps, delegates in-bucket merge and gap-fill to a caller-supplied
//! [`BucketPolicy`], and serves indexed bucket reads. See spec.md §3 and §4.2
//! for the full invariant and state-machine specification this module
//! implements.

use crate::error::{RingError, RondoError};
use crate::period::{bucket_start, Time};
use crate::policy::BucketPolicy;

/// Outcome of a single [`Ring::insert_at`] call.
///
/// spec.md documents backdated-insert rejection as "a design contract, not
/// an error" (§4.2 Failure semantics) — this is why `insert_at` returns this
/// enum rather than a `Result`: there is nothing to propagate, only an
/// outcome callers and tests may want to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The sample landed: either it extended/updated the active bucket, or
    /// it advanced the ring (possibly gap-filling intermediate buckets)
    /// into a new active bucket.
    Inserted,
    /// The sample's timestamp was older than the last timestamp this ring
    /// has accepted. Silently discarded; the ring is unchanged (spec.md §4.2
    /// case I2).
    Rejected,
}

/// A fixed-capacity circular store of one resolution, aggregating an opaque
/// payload `V` under a caller-supplied [`BucketPolicy`].
///
/// `entries` is a single contiguous heap allocation (`Box<[V]>`) made once
/// at construction — the Rust equivalent of the C source's header-plus-
/// flexible-array-member layout (Design Notes §9: "a layout optimization,
/// not a correctness requirement"). No further allocation occurs on
/// `insert_at` or `get`.
#[derive(Debug, Clone)]
pub struct Ring<V, Pol> {
    name: String,
    width: Time,
    entries: Box<[V]>,
    /// `None` encodes the empty-ring sentinel the C source spells `-1`.
    head: Option<usize>,
    tail: Option<usize>,
    /// Lower edge of the bucket currently at `tail`. Meaningless while
    /// empty; defined to be `0` then, matching spec.md §3.
    start: Time,
    /// Most recent timestamp ever accepted, used to reject backdated
    /// inserts. Meaningless while empty; defined to be `0` then.
    last: Time,
    policy: Pol,
}

impl<V, Pol> Ring<V, Pol>
where
    V: Copy + Default,
    Pol: BucketPolicy<V>,
{
    /// Creates a new, empty ring.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidWidth`] if `width <= 0`, or
    /// [`RingError::InvalidCapacity`] if `capacity == 0`. These are the only
    /// two conditions spec.md §4.2 leaves as "caller responsibility"
    /// unvalidated; this crate validates them anyway since safe Rust has no
    /// way to represent the C source's allocation-failure-only `NULL`
    /// return (a `Vec`/`Box` allocation failure aborts the process via the
    /// global allocator, matching the in-kernel deployment's own behavior
    /// on OOM).
    pub fn new(
        name: impl Into<String>,
        width: Time,
        capacity: usize,
        policy: Pol,
    ) -> Result<Self, RondoError> {
        if width <= 0 {
            return Err(RingError::InvalidWidth { width }.into());
        }
        if capacity == 0 {
            return Err(RingError::InvalidCapacity { capacity }.into());
        }

        Ok(Self {
            name: name.into(),
            width,
            entries: vec![V::default(); capacity].into_boxed_slice(),
            head: None,
            tail: None,
            start: 0,
            last: 0,
            policy,
        })
    }

    /// This ring's informational name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This ring's fixed bucket width. Immutable after construction.
    #[must_use]
    pub fn width(&self) -> Time {
        self.width
    }

    /// This ring's fixed bucket capacity. Immutable after construction.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of buckets currently holding data: `0` if empty, otherwise
    /// the wrapped distance from `head` to `tail` inclusive.
    #[must_use]
    pub fn length(&self) -> usize {
        match (self.head, self.tail) {
            (Some(head), Some(tail)) if head <= tail => tail - head + 1,
            (Some(head), Some(tail)) => self.capacity() - head + tail + 1,
            _ => 0,
        }
    }

    /// `true` if no sample has ever been accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    /// Lower edge of the currently active bucket. `0` while empty.
    #[must_use]
    pub fn start(&self) -> Time {
        self.start
    }

    /// Most recent timestamp accepted by this ring. `0` while empty.
    #[must_use]
    pub fn last(&self) -> Time {
        self.last
    }

    /// Returns the `i`-th logical bucket, oldest first (`0`-based).
    ///
    /// `None` if `i` is not in `[0, length())`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&V> {
        if i >= self.length() {
            return None;
        }
        let head = self.head?;
        let idx = (head + i) % self.capacity();
        self.entries.get(idx)
    }

    fn tail_index(&self) -> Option<usize> {
        self.tail
    }

    /// Advances `tail` by one slot, evicting `head` if the ring is full, and
    /// moves `start` to the next bucket boundary.
    ///
    /// spec.md §4.2 computes the new `start` as
    /// `bucket_start(start + width + 1, width)`, describing the `+ 1` as a
    /// guard ensuring the advance is never a no-op. Since `start` is always
    /// `width`-aligned (ring invariant 2), `start + width` is *already* the
    /// next boundary, so `bucket_start` of it is a no-op in the intended,
    /// correct sense: it returns `start + width` unchanged. The `+ 1` adds
    /// nothing for any `width > 1` (`bucket_start` still returns
    /// `start + width`), and for `width == 1` it is actually wrong — every
    /// integer is congruent to `0 mod 1`, so `start + width + 1` floors back
    /// down to `start + 2`, silently skipping a bucket. This rewrite takes
    /// the invariant at face value and advances directly: `start + width` is
    /// already bucket-aligned, so no call to `bucket_start` is needed at
    /// all, and the `width == 1` degeneracy above does not arise.
    fn advance(&mut self) {
        let capacity = self.capacity();
        let tail = self.tail.expect("advance called on empty ring");
        let new_tail = (tail + 1) % capacity;
        if Some(new_tail) == self.head {
            self.head = Some((new_tail + 1) % capacity);
        }
        self.tail = Some(new_tail);
        self.start += self.width;
    }

    /// Inserts `payload` timestamped `t`, running the insert state machine
    /// from spec.md §4.2 (cases I1–I4).
    pub fn insert_at(&mut self, payload: &V, t: Time) -> InsertOutcome {
        // I1: ring is empty.
        let Some(tail) = self.tail_index() else {
            self.head = Some(0);
            self.tail = Some(0);
            self.entries[0] = *payload;
            self.start = bucket_start(t, self.width);
            self.last = t;
            return InsertOutcome::Inserted;
        };

        // I2: backdated sample, rejected as a no-op.
        if t < self.last {
            return InsertOutcome::Rejected;
        }

        let t0 = bucket_start(t, self.width);

        if t0 == self.start {
            // I3: falls into the already-active bucket.
            self.last = t;
            let updated = self.policy.update(self.width, &self.entries[tail], payload);
            self.entries[tail] = updated;
            return InsertOutcome::Inserted;
        }

        // I4: advance across the gap to the sample's bucket, gap-filling
        // every intermediate bucket (including, transiently, the final one
        // — see the doc comment on the loop below) via `zero`, then
        // overwrite the final active bucket with the raw sample.
        debug_assert!(t0 > self.start);
        while self.start < t0 {
            // `prev_idx` is always `Some`: I4 only runs once the ring has
            // already accepted a first sample via I1, so `tail` is defined.
            let prev_idx = self.tail_index().expect("I4 only runs on a non-empty ring");
            self.advance();
            let new_tail = self.tail_index().expect("just advanced");
            let zeroed = self.policy.zero(self.width, &self.entries[prev_idx], payload);
            self.entries[new_tail] = zeroed;
        }
        let new_tail = self.tail_index().expect("I4 always advances at least once");
        self.entries[new_tail] = *payload;
        self.start = t0;
        self.last = t;
        InsertOutcome::Inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CarryForward, Envelope, KeepFirst, MinMaxEnvelope, RunningMean};

    #[test]
    fn empty_ring_has_zero_length() {
        let ring = Ring::<f64, KeepFirst>::new("r", 30, 10, KeepFirst).unwrap();
        assert_eq!(ring.length(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.get(0), None);
    }

    #[test]
    fn rejects_zero_width_or_capacity() {
        assert!(Ring::<f64, KeepFirst>::new("r", 0, 10, KeepFirst).is_err());
        assert!(Ring::<f64, KeepFirst>::new("r", 30, 0, KeepFirst).is_err());
    }

    #[test]
    fn first_insert_establishes_active_bucket() {
        let mut ring = Ring::<f64, KeepFirst>::new("r", 30, 10, KeepFirst).unwrap();
        assert_eq!(ring.insert_at(&5.0, 100), InsertOutcome::Inserted);
        assert_eq!(ring.length(), 1);
        assert_eq!(ring.get(0), Some(&5.0));
        assert_eq!(ring.start(), 90);
        assert_eq!(ring.last(), 100);
    }

    #[test]
    fn backdated_insert_is_rejected_without_mutation() {
        let mut ring = Ring::<f64, KeepFirst>::new("r", 30, 10, KeepFirst).unwrap();
        ring.insert_at(&5.0, 100);
        let before = (ring.start(), ring.last(), ring.length());
        assert_eq!(ring.insert_at(&9.0, 50), InsertOutcome::Rejected);
        assert_eq!((ring.start(), ring.last(), ring.length()), before);
        assert_eq!(ring.get(0), Some(&5.0));
    }

    #[test]
    fn same_bucket_insert_updates_without_advancing() {
        let mut ring = Ring::<f64, KeepFirst>::new("r", 30, 10, KeepFirst).unwrap();
        ring.insert_at(&5.0, 90);
        ring.insert_at(&9.0, 95);
        assert_eq!(ring.length(), 1);
        assert_eq!(ring.get(0), Some(&5.0)); // KeepFirst: later sample ignored
        assert_eq!(ring.last(), 95);
    }

    #[test]
    fn gap_advances_and_gap_fills() {
        let mut ring = Ring::<f64, crate::policy::KeepLast>::new("r", 30, 10, crate::policy::KeepLast).unwrap();
        ring.insert_at(&1.0, 0); // bucket [0,30)
        ring.insert_at(&2.0, 95); // bucket [90,120), skips [30,60) and [60,90)
        assert_eq!(ring.length(), 4);
        // Oldest-first: [0,30)=1.0, [30,60)=zero(KeepLast->incoming=2.0),
        // [60,90)=2.0, [90,120)=2.0 (raw overwrite).
        assert_eq!(ring.get(0), Some(&1.0));
        assert_eq!(ring.get(1), Some(&2.0));
        assert_eq!(ring.get(2), Some(&2.0));
        assert_eq!(ring.get(3), Some(&2.0));
    }

    #[test]
    fn eviction_after_capacity_exceeded() {
        let mut ring = Ring::<f64, crate::policy::KeepLast>::new("r", 1, 3, crate::policy::KeepLast).unwrap();
        for i in 0..8i64 {
            ring.insert_at(&(i as f64), i);
        }
        assert_eq!(ring.length(), 3);
        assert_eq!(ring.get(0), Some(&5.0));
        assert_eq!(ring.get(1), Some(&6.0));
        assert_eq!(ring.get(2), Some(&7.0));
    }

    #[test]
    fn keep_first_idempotent_on_duplicate_insert() {
        let mut a = Ring::<f64, KeepFirst>::new("a", 30, 10, KeepFirst).unwrap();
        let mut b = Ring::<f64, KeepFirst>::new("b", 30, 10, KeepFirst).unwrap();
        a.insert_at(&7.0, 100);
        b.insert_at(&7.0, 100);
        b.insert_at(&7.0, 100);
        assert_eq!(a.get(0), b.get(0));
        assert_eq!(a.length(), b.length());
    }

    /// Exercises the running-mean EWMA policy the way spec.md §8 scenario 2
    /// does: a mix of direct same-bucket updates (exercising the `N =
    /// width` formula), a multi-bucket gap that must carry the incoming
    /// sample forward through every skipped bucket (cases I3/I4), and a
    /// final bucket fed three samples in a row. Expected values below are
    /// the closed-form result of the same state machine, not a transcript
    /// from the original tool.
    #[test]
    fn running_mean_gap_and_update_scenario() {
        let mut ring = Ring::<f64, RunningMean>::new("r", 30, 10, RunningMean { unit: 1.0 }).unwrap();
        let samples: [(i64, f64); 10] = [
            (1, 5.0),
            (10, 5.0),
            (40, 5.0),
            (70, 5.0),
            (190, 10.0), // jumps from bucket 2 to bucket 6, smearing 3,4,5
            (220, 15.0),
            (250, 8.0),
            (280, 305.0),
            (281, 10.0),
            (282, 20.0),
        ];
        for (t, v) in samples {
            ring.insert_at(&v, t);
        }
        assert_eq!(ring.length(), 10);
        let expected = [
            5.0, 5.0, 5.0, 10.0, 10.0, 10.0, 10.0, 15.0, 8.0, 285.994_444_444_444_4,
        ];
        for (i, exp) in expected.iter().enumerate() {
            let got = *ring.get(i).unwrap();
            assert!(
                (got - exp).abs() < 1e-6,
                "bucket {i}: expected {exp}, got {got}"
            );
        }
    }

    #[test]
    fn min_max_envelope_single_bucket_scenario() {
        // width 60 with timestamps 0..59 all land in the same bucket, so
        // every sample after the first takes the I3 update path and the
        // envelope widens to cover the whole run without ever gap-filling.
        let mut ring = Ring::<Envelope, MinMaxEnvelope>::new("txg", 60, 10, MinMaxEnvelope).unwrap();
        for (i, txg) in (1u64..=60).enumerate() {
            ring.insert_at(&Envelope::point(txg), i as i64);
        }
        assert_eq!(ring.length(), 1);
        assert_eq!(ring.get(0), Some(&Envelope { low: 1, high: 60 }));
    }

    #[test]
    fn carry_forward_on_capacity_one_ring_is_well_defined() {
        // spec.md §9's Open Question: on a capacity-1 ring, the carry-forward
        // zero policy's "previous bucket" is the same slot about to be
        // overwritten. That is well-defined (it is read before being
        // written), matching the original's own documented resolution.
        let mut ring = Ring::<f64, CarryForward>::new("r", 10, 1, CarryForward).unwrap();
        ring.insert_at(&1.0, 0);
        ring.insert_at(&2.0, 10);
        assert_eq!(ring.length(), 1);
        assert_eq!(ring.get(0), Some(&2.0));
    }
}
