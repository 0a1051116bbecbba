//! Multi-ring stack: component C of the design.
//!
//! A [`Stack`] layers an ordered sequence of [`Ring`]s of strictly increasing
//! bucket width, giving callers fine resolution over a short horizon and
//! coarse resolution over a long one from a single handle. Every insert fans
//! out to every ring (spec.md §4.3); every query walks the rings
//! finest-first and answers from the first one whose retained window still
//! covers the requested timestamp, which is always the tightest answer
//! available.

use crate::error::{RingError, RondoError, StackError};
use crate::period::{bucket_start, Time};
use crate::policy::BucketPolicy;
use crate::ring::Ring;

/// Declares one ring's shape within a [`Stack`], before the aggregation
/// policy is attached.
///
/// Splitting construction this way — a plain, policy-free spec plus a single
/// policy supplied once to [`Stack::new`] — is what lets a `Stack` enforce
/// spec.md §4.3's "all rings share the same callback pair" rule structurally
/// rather than by convention: there is nowhere in this API to pass a
/// different policy per ring.
#[derive(Debug, Clone)]
pub struct RingSpec {
    name: String,
    width: Time,
    capacity: usize,
}

impl RingSpec {
    /// Declares a ring of the given name, bucket width, and bucket capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidWidth`] or [`RingError::InvalidCapacity`]
    /// under the same conditions as [`Ring::new`] — validated here too so a
    /// malformed spec is rejected before a [`Stack`] ever touches it.
    pub fn new(name: impl Into<String>, width: Time, capacity: usize) -> Result<Self, RondoError> {
        if width <= 0 {
            return Err(RingError::InvalidWidth { width }.into());
        }
        if capacity == 0 {
            return Err(RingError::InvalidCapacity { capacity }.into());
        }
        Ok(Self {
            name: name.into(),
            width,
            capacity,
        })
    }

    /// This spec's informational name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This spec's declared bucket width.
    #[must_use]
    pub fn width(&self) -> Time {
        self.width
    }

    /// This spec's declared bucket capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The result of a successful [`Stack::query`]: a reference into whichever
/// ring's bucket answered it, plus the width of that ring.
///
/// The width on the hit is how a caller distinguishes "exact recent value"
/// from "tier-3 backstop consolidated over a day" without having to re-walk
/// the stack's ring list themselves.
#[derive(Debug)]
pub struct Hit<'a, V> {
    /// The bucket's current aggregated payload.
    pub payload: &'a V,
    /// The bucket width of the ring that answered the query.
    pub width: Time,
    /// The name of the ring that answered the query.
    pub ring: &'a str,
}

/// An ordered stack of rings of strictly increasing bucket width, sharing one
/// aggregation policy, presenting fan-out insert and finest-first query.
///
/// See spec.md §4.3 for the stack-level contract this type implements.
#[derive(Debug, Clone)]
pub struct Stack<V, Pol> {
    name: String,
    rings: Vec<Ring<V, Pol>>,
}

impl<V, Pol> Stack<V, Pol>
where
    V: Copy + Default,
    Pol: BucketPolicy<V> + Clone,
{
    /// Builds a stack from ring specs in finest-to-coarsest order, cloning
    /// `policy` into every ring.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NoRings`] if `specs` is empty,
    /// [`StackError::NotStrictlyIncreasing`] if any spec's width does not
    /// exceed the previous spec's width, or [`StackError::RingConstruction`]
    /// if a spec (already validated in isolation by [`RingSpec::new`])
    /// nonetheless fails to build a ring.
    pub fn new(
        name: impl Into<String>,
        specs: Vec<RingSpec>,
        policy: Pol,
    ) -> Result<Self, RondoError> {
        if specs.is_empty() {
            return Err(StackError::NoRings.into());
        }

        let mut rings = Vec::with_capacity(specs.len());
        let mut previous_width: Option<Time> = None;

        for (index, spec) in specs.into_iter().enumerate() {
            if let Some(previous) = previous_width {
                if spec.width <= previous {
                    return Err(StackError::NotStrictlyIncreasing {
                        index,
                        width: spec.width,
                        previous,
                    }
                    .into());
                }
            }
            previous_width = Some(spec.width);

            let ring = Ring::new(spec.name.clone(), spec.width, spec.capacity, policy.clone())
                .map_err(|err| match err {
                    RondoError::Ring(source) => StackError::RingConstruction {
                        index,
                        name: spec.name.clone(),
                        source,
                    },
                    RondoError::Stack(_) => {
                        unreachable!("Ring::new only ever returns RondoError::Ring")
                    }
                })?;
            rings.push(ring);
        }

        Ok(Self {
            name: name.into(),
            rings,
        })
    }

    /// This stack's informational name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stack's rings, finest-to-coarsest.
    #[must_use]
    pub fn rings(&self) -> &[Ring<V, Pol>] {
        &self.rings
    }

    /// Inserts `payload` timestamped `t` into every ring in the stack.
    ///
    /// spec.md §4.3: a stack insert is simply every ring's `insert_at`
    /// called with the same arguments — there is no cross-ring coordination,
    /// each ring independently runs its own I1–I4 state machine.
    pub fn add_at(&mut self, payload: &V, t: Time) {
        for ring in &mut self.rings {
            ring.insert_at(payload, t);
        }
    }

    /// Finds the tightest bucket covering timestamp `t`, preferring the
    /// finest-resolution ring that still retains it.
    ///
    /// spec.md §4.3's query walk: if `t` is newer than the finest ring has
    /// ever seen, there is no answer (a stack never extrapolates forward).
    /// Otherwise each ring is checked finest-first; a ring "covers" `t` when
    /// `t`'s bucket start is still within that ring's retained window
    /// (between its oldest retained bucket's start and its active bucket's
    /// start, inclusive). The first covering ring found is the tightest
    /// possible answer, since rings are walked in increasing-width order.
    #[must_use]
    pub fn query(&self, t: Time) -> Option<Hit<'_, V>> {
        let finest = self.rings.first()?;
        if finest.is_empty() || t > finest.last() {
            return None;
        }

        for ring in &self.rings {
            if ring.is_empty() {
                continue;
            }
            let width = ring.width();
            let t0 = bucket_start(t, width);
            let length = ring.length();
            #[allow(clippy::cast_possible_wrap)]
            let horizon_low = ring.start() - width * (length as Time - 1);
            if t0 < horizon_low {
                continue;
            }
            // t <= finest.last() == ring.last() (every ring sees the same
            // inserts in the same order), so t0 <= ring.start() always holds
            // here; the division below is therefore always exact and in
            // range.
            #[allow(clippy::cast_sign_loss)]
            let index = ((t0 - horizon_low) / width) as usize;
            if let Some(payload) = ring.get(index) {
                return Some(Hit {
                    payload,
                    width,
                    ring: ring.name(),
                });
            }
        }

        None
    }
}
