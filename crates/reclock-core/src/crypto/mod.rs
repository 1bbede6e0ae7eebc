//! Cryptographic primitives for the clock chains.
//!
//! Two one-way constructions back the clocks:
//!
//! - **Hash chains** ([`hash`]): recursive SHA-256, terminating when the
//!   preimage (the seed) is revealed.
//! - **Point chains** ([`point`]): recursive Ed25519 point accumulation
//!   with a parallel scalar chain that supports signing at every depth.
//!
//! All equality decisions on digests and points go through the
//! constant-time comparison in [`hash::ct_eq`].

pub mod hash;
pub mod point;
