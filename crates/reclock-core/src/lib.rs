//! # reclock-core
//!
//! Reverse-entropy logical clocks: verifiable, one-way causal counters.
//!
//! A clock owner pre-computes a finite causality chain with a one-way
//! function and then reveals intermediate states in *reverse* order to
//! advance time. Observers holding only the chain's public terminal
//! element (the clock's uuid) can verify every advancement without
//! trusting the owner. Two chain constructions are provided, and both
//! lift into vector clocks that order events across nodes:
//!
//! - **[`HashClock`]**: a SHA-256 hash chain. Provably terminates when
//!   the seed itself is revealed.
//! - **[`PointClock`]**: an Ed25519 point chain whose certificates can
//!   carry messages signed under the scalar matching the revealed point.
//! - **[`VectorHashClock`] / [`VectorPointClock`]**: per-node sub-clocks
//!   aggregated into vector timestamps with happens-before and
//!   concurrency checks.
//!
//! ## Example
//!
//! ```rust
//! use reclock_core::prelude::*;
//!
//! # fn example() -> Result<(), reclock_core::ClockError> {
//! // The owner sets up a chain supporting 10 advancements and keeps the
//! // updater; the clock (or just its uuid) is what observers hold.
//! let (mut clock, updater) = HashClock::setup(10)?;
//!
//! // Advancing to time 3 reveals the chain state 7 levels deep; any
//! // observer can verify it against the uuid alone.
//! let certificate = updater.advance(3)?;
//! clock.update(&certificate)?;
//! assert_eq!(clock.time(), 3);
//! assert!(clock.verify());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Trust model
//!
//! Chains are one-way: without the seed, producing a state that hashes
//! (or folds) into the uuid is computationally infeasible, so observers
//! need no channel security and no trust in the owner beyond seed
//! secrecy. An owner who leaks the seed can forge arbitrary future
//! states; all clock state is public by design.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod vector;

pub use clock::{
    Clock, ClockUpdater, HashClock, HashClockUpdater, HashTimestamp, MessageProof, PointClock,
    PointClockUpdater, PointTimestamp, Timestamp,
};
pub use codec::Envelope;
pub use error::ClockError;
pub use vector::{NodeId, VectorClock, VectorHashClock, VectorPointClock, VectorTimestamp};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{
        Clock, ClockUpdater, HashClock, HashClockUpdater, HashTimestamp, MessageProof,
        PointClock, PointClockUpdater, PointTimestamp, Timestamp,
    };
    pub use crate::error::ClockError;
    pub use crate::vector::{
        NodeId, VectorClock, VectorHashClock, VectorPointClock, VectorTimestamp,
    };
}
