//! # rondo
//!
//! Embedded round-robin time-series storage engine.
//!
//! rondo is a Rust library for fixed-memory, constant-time storage of an
//! opaque, caller-defined time-series payload, designed to be embedded
//! directly in storage kernels, dataplanes, and other performance-critical
//! systems software — the motivating use case is tracking a copy-on-write
//! filesystem's transaction groups, but the engine never inspects what it
//! stores. Think rrdtool's storage philosophy with the aggregation policy
//! supplied by the caller instead of hard-coded.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Zero-allocation hot path: one allocation per ring at construction, none
//!   on insert or query
//! - A single physical layout (a circular buffer of equal-width buckets)
//!   serves both ingestion and historical query
//! - Aggregation is caller-supplied policy ([`BucketPolicy`]), not hard-coded
//!   arithmetic — the engine only sequences calls and owns memory
//! - Retention across disparate horizons comes from layering rings of
//!   increasing bucket width into a [`Stack`], all written on every insert
//! - No persistence, no internal synchronization, no background threads —
//!   serialize access externally, same as the kernel code this is meant to
//!   sit inside of
//!
//! ## Quick Start
//!
//! ```rust
//! use rondo::{BucketPolicy, RingSpec, Stack, Time};
//!
//! #[derive(Clone)]
//! struct KeepLast;
//!
//! impl BucketPolicy<f64> for KeepLast {
//!     fn update(&self, _width: Time, _current: &f64, incoming: &f64) -> f64 {
//!         *incoming
//!     }
//!     fn zero(&self, _width: Time, _previous: &f64, incoming: &f64) -> f64 {
//!         *incoming
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // One second resolution kept for 100 buckets, one hundred-second tier
//! // backstopping it for ten times the horizon.
//! let specs = vec![
//!     RingSpec::new("fine", 1, 100)?,
//!     RingSpec::new("coarse", 100, 100)?,
//! ];
//! let mut stack = Stack::new("cpu.usage", specs, KeepLast)?;
//!
//! stack.add_at(&85.5, 1);
//! stack.add_at(&90.0, 2);
//!
//! if let Some(hit) = stack.query(2) {
//!     println!("bucket width {}: {}", hit.width, hit.payload);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Stack`] — Top-level handle: an ordered sequence of [`Ring`]s of
//!   increasing width, fanning inserts out and answering finest-first queries
//! - [`Ring`] — A single-resolution circular buffer
//! - [`BucketPolicy`] — The aggregation policy trait (the engine's two
//!   "callbacks" expressed as trait methods) plus a handful of ready-made
//!   policies
//! - [`period`] — The pure `bucket_start` arithmetic shared by every ring
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`stack`] — Multi-ring stack: construction, fan-out insert, query
//! - [`ring`] — Single-resolution ring buffer: insert state machine, reads
//! - [`policy`] — The `BucketPolicy` trait and its built-in implementations
//! - [`period`] — Bucket-start arithmetic
//! - [`error`] — Error types

pub mod error;
pub mod period;
pub mod policy;
pub mod ring;
pub mod stack;

// Re-export primary API types at crate root for convenience.
pub use error::{Result, RondoError};
pub use period::{bucket_start, Time};
pub use policy::BucketPolicy;
pub use ring::{InsertOutcome, Ring};
pub use stack::{Hit, RingSpec, Stack};
