//! The aggregation policy interface and a handful of ready-made policies.
//!
//! spec.md §4.2 specifies two callbacks per ring — `update` and `zero` — as
//! raw function pointers so the engine never has to know what a payload
//! means. Design Notes §9 lists three ways to express that in a systems
//! rewrite and prefers "(c) a type parameter carrying a trait/interface with
//! `update`/`zero` methods... because it devirtualizes the hot path" when
//! the target language has allocation-free monomorphization. Rust does, so
//! [`BucketPolicy`] is that trait.
//!
//! Design Notes §9 also calls out that the callback signature should carry
//! caller context that the original C source omits. Here that context is
//! the ring's `width`, passed explicitly to both methods — it lets a single
//! policy *value*, cloned into every ring of a [`crate::Stack`], adapt its
//! arithmetic (an exponentially-weighted mean's divisor, for instance) to
//! each ring's own resolution without needing separate per-ring state.

use crate::period::Time;

/// Aggregation policy for one ring: how a new sample merges into the
/// currently active bucket, and how a bucket the engine skips over while
/// filling a gap gets initialized.
///
/// Implementations are typically zero-sized or hold only policy parameters
/// (never per-ring mutable state — the ring itself owns all mutable state;
/// see [`crate::Ring`]). `&self` rather than `&mut self` keeps a single
/// policy value shareable (`Clone`) across every ring in a stack.
pub trait BucketPolicy<V> {
    /// Called when a new sample falls into the bucket that is already the
    /// active one (spec.md §4.2 case I3). Reads the active bucket's current
    /// value and the incoming sample, returns the bucket's new value.
    fn update(&self, width: Time, current: &V, incoming: &V) -> V;

    /// Called once for each intermediate bucket advanced over while
    /// skipping forward across a gap to the sample's new bucket (spec.md
    /// §4.2 case I4), to initialize that just-advanced bucket.
    ///
    /// `previous` is the chronologically preceding bucket's value. This is
    /// always available, even on a ring built with `capacity == 1`: `zero`
    /// only ever runs once a ring has accepted its first sample (the empty
    /// ring takes the I1 path instead, never I4), so the slot `previous`
    /// reads always holds either a real prior value or the ring's initial
    /// `V::default()`. On a `capacity == 1` ring this slot is the very one
    /// about to be overwritten with `zero`'s own result, which is exactly
    /// spec.md §9's resolution of that Open Question ("the original
    /// documents it as safe because the empty case takes a different
    /// path") — not a precondition callers or policies need to guard.
    fn zero(&self, width: Time, previous: &V, incoming: &V) -> V;
}

/// Keeps whatever sample arrived first in a bucket; later samples in the
/// same bucket are ignored. Gap-filled buckets smear the incoming sample
/// forward.
///
/// Mirrors spec.md §8's idempotence property: inserting the same `(t, v)`
/// twice into a ring using `KeepFirst` leaves the ring identical to a single
/// insert.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepFirst;

impl<V: Copy> BucketPolicy<V> for KeepFirst {
    fn update(&self, _width: Time, current: &V, _incoming: &V) -> V {
        *current
    }

    fn zero(&self, _width: Time, _previous: &V, incoming: &V) -> V {
        *incoming
    }
}

/// Always overwrites the active bucket with the most recent sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepLast;

impl<V: Copy> BucketPolicy<V> for KeepLast {
    fn update(&self, _width: Time, _current: &V, incoming: &V) -> V {
        *incoming
    }

    fn zero(&self, _width: Time, _previous: &V, incoming: &V) -> V {
        *incoming
    }
}

/// Exponentially-weighted running mean over `f64` payloads, with the bucket
/// width in whole units of `Time` standing in for the averaging window `N`
/// (spec.md §8 scenario 2's `new = old - old/N + v/N`).
///
/// `unit` converts a width expressed in the caller's `Time` unit into the
/// float `N` the EWMA divides by — for the worked example in spec.md (width
/// in milliseconds, `N` in seconds) that's `1000.0`; pass `1.0` if `Time`
/// already counts in the unit you want `N` expressed in.
///
/// Gap-filled buckets carry the incoming sample forward verbatim (the same
/// `zero` policy spec.md §8 scenario 2 uses), which is why buckets spanning
/// a gap hold the exact value of the sample that ended the gap rather than
/// an interpolated or decayed one.
#[derive(Debug, Clone, Copy)]
pub struct RunningMean {
    /// Divides the ring's `width` (converted via this factor) to produce
    /// the EWMA's `N`.
    pub unit: f64,
}

impl RunningMean {
    /// A running mean whose `N` is the bucket width directly, with no unit
    /// conversion (`unit == 1.0`).
    #[must_use]
    pub fn new() -> Self {
        Self { unit: 1.0 }
    }
}

impl Default for RunningMean {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketPolicy<f64> for RunningMean {
    fn update(&self, width: Time, current: &f64, incoming: &f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = (width as f64) / self.unit;
        current - current / n + incoming / n
    }

    fn zero(&self, _width: Time, _previous: &f64, incoming: &f64) -> f64 {
        *incoming
    }
}

/// Widens a `{low, high}` envelope to cover every sample seen in a bucket.
///
/// `zero` carries the previous bucket's envelope forward rather than the
/// incoming sample — this is the "old value" carry-forward variant spec.md
/// §4.2 describes for "transaction-group-style monotone sequences where an
/// average would be nonsense" (spec.md §8 scenario 4).
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxEnvelope;

/// A `{low, high}` envelope payload, widened by [`MinMaxEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Lowest value seen in the bucket.
    pub low: u64,
    /// Highest value seen in the bucket.
    pub high: u64,
}

impl Envelope {
    /// A degenerate envelope covering exactly one value.
    #[must_use]
    pub fn point(v: u64) -> Self {
        Self { low: v, high: v }
    }
}

impl BucketPolicy<Envelope> for MinMaxEnvelope {
    fn update(&self, _width: Time, current: &Envelope, incoming: &Envelope) -> Envelope {
        Envelope {
            low: current.low.min(incoming.low),
            high: current.high.max(incoming.high),
        }
    }

    fn zero(&self, _width: Time, previous: &Envelope, _incoming: &Envelope) -> Envelope {
        *previous
    }
}

/// Carries the previous bucket's value forward unchanged into a newly
/// advanced bucket, merging same-bucket samples by simply keeping the
/// latest one. A generic, payload-agnostic carry-forward policy for
/// payloads where there is no natural envelope to widen.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarryForward;

impl<V: Copy> BucketPolicy<V> for CarryForward {
    fn update(&self, _width: Time, _current: &V, incoming: &V) -> V {
        *incoming
    }

    fn zero(&self, _width: Time, previous: &V, _incoming: &V) -> V {
        *previous
    }
}
