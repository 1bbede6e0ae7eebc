//! Error types shared across the clock, vector, and codec layers.

use thiserror::Error;

/// Errors surfaced by clock construction, advancement, folding, and the
/// wire codec.
///
/// Every fallible operation in this crate returns this type. Mutating
/// operations have strong exception safety: on any error the receiver is
/// left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// A caller-supplied parameter violates a construction invariant
    /// (lifetime out of range, empty seed, duplicate node id, ...).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable description of the violated invariant.
        reason: String,
    },

    /// A certificate failed chain verification, was not strictly newer than
    /// the current state, or advanced past the clock's lifetime.
    #[error("invalid update at time {time}: {reason}")]
    InvalidUpdate {
        /// The time claimed by the rejected certificate.
        time: i64,
        /// Why the certificate was rejected.
        reason: String,
    },

    /// A signed certificate carried a signature that does not verify
    /// against its claimed point and message.
    #[error("signature verification failed for signed timestamp at time {time}")]
    InvalidSignature {
        /// The time claimed by the rejected certificate.
        time: i64,
    },

    /// A vector update referenced a node id that is not a member of the
    /// vector.
    #[error("unknown node id: {node_id}")]
    UnknownNode {
        /// Hex rendering of the unknown node id.
        node_id: String,
    },

    /// A vector update was addressed to a different vector clock.
    #[error("incompatible vector: expected uuid {expected}, got {got}")]
    IncompatibleVector {
        /// Hex uuid of the receiving vector.
        expected: String,
        /// Hex uuid carried by the update.
        got: String,
    },

    /// A packed payload could not be decoded: unknown tag, truncation,
    /// trailing bytes, or an inner decode failure.
    #[error("malformed payload: {reason}")]
    BadFormat {
        /// What made the payload undecodable.
        reason: String,
    },
}

impl ClockError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_update(time: i64, reason: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            time,
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_format(reason: impl Into<String>) -> Self {
        Self::BadFormat {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_node(node_id: &[u8]) -> Self {
        Self::UnknownNode {
            node_id: hex::encode(node_id),
        }
    }
}
