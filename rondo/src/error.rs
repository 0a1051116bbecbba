//! Error types for the rondo time-series storage engine.
//!
//! The engine is total on well-typed inputs: once a [`crate::Ring`] or
//! [`crate::Stack`] exists, no operation on it can fail (`insert_at` silently
//! no-ops on backdated samples per spec, it does not error; `query` returns
//! `None` on a miss, it does not error). The only recoverable failures this
//! crate raises are invalid construction parameters — everything else is
//! infallible by construction.

use thiserror::Error;

/// The main error type for all rondo operations.
#[derive(Error, Debug)]
pub enum RondoError {
    /// Error constructing or configuring a single ring.
    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    /// Error constructing or configuring a multi-ring stack.
    #[error("stack error: {0}")]
    Stack(#[from] StackError),
}

/// Errors that can occur when constructing a [`crate::Ring`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// Bucket width must be strictly positive.
    #[error("ring width must be > 0, got {width}")]
    InvalidWidth {
        /// The rejected width.
        width: crate::period::Time,
    },

    /// Bucket capacity must be at least one.
    #[error("ring capacity must be >= 1, got {capacity}")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },
}

/// Errors that can occur when constructing a [`crate::Stack`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A stack must be built from at least one ring spec.
    #[error("a stack requires at least one ring spec")]
    NoRings,

    /// Ring specs were not supplied in strictly increasing width order.
    ///
    /// The stack is the access order: finest resolution first. Accepting an
    /// unordered or duplicate-width list silently would make the
    /// finest-first query walk (spec.md §4.3) return whichever ring happens
    /// to come first in the list rather than the one with the smallest
    /// width, defeating the "most precise answer" correctness argument.
    #[error(
        "ring widths must be strictly increasing: spec {index} has width {width}, \
         which does not exceed the previous spec's width {previous}"
    )]
    NotStrictlyIncreasing {
        /// Index of the offending spec.
        index: usize,
        /// Its width.
        width: crate::period::Time,
        /// The previous spec's width.
        previous: crate::period::Time,
    },

    /// Propagated failure constructing one of the stack's rings.
    #[error("failed to construct ring {index} (\"{name}\"): {source}")]
    RingConstruction {
        /// Index of the offending spec.
        index: usize,
        /// Name of the offending spec.
        name: String,
        /// The underlying ring error.
        #[source]
        source: RingError,
    },
}

/// Type alias for `Result<T, RondoError>`.
pub type Result<T> = std::result::Result<T, RondoError>;
