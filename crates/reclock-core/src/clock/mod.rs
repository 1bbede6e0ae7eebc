//! Clock capability traits and the two chain constructions.
//!
//! A clock is the observer half of a reverse-entropy chain: it holds the
//! chain's public terminal element (the *uuid*) and the most recently
//! verified position, and folds in timestamp certificates produced by the
//! matching updater. The updater is the owner half: it holds the secret
//! seed and can reveal the chain state at any time up to the declared
//! lifetime.
//!
//! The capability set is expressed as two traits so the vector layer can
//! treat both constructions uniformly:
//!
//! - [`Clock`]: read, verified update, CRDT merge, self-verification,
//!   wire encoding.
//! - [`ClockUpdater`]: certificate issuance and wire encoding.
//!
//! Certificates implement [`Timestamp`], which carries the claimed time
//! and the entry-level wire encoding used inside vector timestamps.

mod hash_clock;
mod point_clock;

use crate::codec::Reader;
use crate::error::ClockError;

pub use hash_clock::{
    HashClock, HashClockUpdater, HashTimestamp, HASH_CLOCK_SEED_SIZE, MAX_LIFETIME,
};
pub use point_clock::{
    MessageProof, PointClock, PointClockUpdater, PointTimestamp, MAX_MESSAGE_SIZE,
    POINT_CLOCK_SEED_SIZE,
};

/// Largest accepted seed, in bytes. Bounds every derived chain state so
/// packed clocks always fit their length prefixes.
pub const MAX_SEED_SIZE: usize = 1024;

/// Largest chain state a certificate may carry, in bytes. Chain states
/// are 32-byte digests or points everywhere except the hash chain's
/// terminal reveal, which is the seed itself.
pub const MAX_STATE_SIZE: usize = MAX_SEED_SIZE;

/// A timestamp certificate: a claimed time plus the chain state backing
/// the claim.
pub trait Timestamp: Clone + core::fmt::Debug {
    /// Wire tag of a vector timestamp carrying this certificate type.
    const VECTOR_TAG: u8;

    /// The time this certificate advances to.
    fn time(&self) -> i64;

    /// Writes the certificate as a self-delimiting vector-timestamp entry.
    fn encode_entry(&self, buf: &mut Vec<u8>);

    /// Reads one certificate written by [`Timestamp::encode_entry`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation or field bounds
    /// violations.
    fn decode_entry(reader: &mut Reader<'_>) -> Result<Self, ClockError>;
}

/// Observer side of a reverse-entropy chain.
pub trait Clock: Clone + Sized {
    /// Certificate type this clock verifies and folds.
    type Timestamp: Timestamp;

    /// Wire tag of the packed clock.
    const WIRE_TAG: u8;
    /// Wire tag of a vector of these clocks.
    const VECTOR_WIRE_TAG: u8;

    /// The chain's public terminal element.
    fn uuid(&self) -> &[u8; 32];

    /// Current time; `-1` until the first certificate is folded.
    fn time(&self) -> i64;

    /// Declared chain lifetime, when known to this observer. Clocks primed
    /// inside a vector from a bare uuid or a first certificate have no
    /// bound and accept any chain-verified advancement.
    fn lifetime(&self) -> Option<u32>;

    /// Current position as a certificate: the last accepted timestamp, or
    /// `(-1, uuid)` before any advancement.
    fn read(&self) -> Self::Timestamp;

    /// Checks a certificate against the chain without mutating, reporting
    /// why it fails.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidUpdate`] when the certificate does not
    /// chain to this clock's uuid or exceeds a known lifetime, and
    /// [`ClockError::InvalidSignature`] when an attached proof does not
    /// verify.
    fn check_timestamp(&self, timestamp: &Self::Timestamp) -> Result<(), ClockError>;

    /// Folds a certificate: applies it when strictly newer and
    /// chain-verified, skips it when stale.
    ///
    /// Returns `Ok(true)` when state advanced and `Ok(false)` for a stale
    /// certificate (idempotent re-delivery). This is the convergent merge
    /// used by vector folding: certificates carry absolute positions, so
    /// out-of-order and duplicate delivery reach the same final state.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidUpdate`] or
    /// [`ClockError::InvalidSignature`] as in
    /// [`Clock::check_timestamp`]; on error the clock is unchanged.
    fn merge(&mut self, timestamp: &Self::Timestamp) -> Result<bool, ClockError>;

    /// Re-verifies the current position against the uuid. A clock fresh
    /// from `unpack` that returns `false` here was not produced by an
    /// honest chain.
    fn verify(&self) -> bool;

    /// Creates an observer with no lifetime bound from a bare uuid, at
    /// position `(-1, uuid)`.
    fn observer(uuid: [u8; 32]) -> Self;

    /// Creates an observer whose chain is defined by its first
    /// certificate: the uuid is derived by folding the one-way function
    /// over the certificate's state.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidUpdate`] for certificates that cannot
    /// anchor a chain and [`ClockError::InvalidSignature`] for a bad
    /// attached proof.
    fn from_timestamp(timestamp: &Self::Timestamp) -> Result<Self, ClockError>;

    /// Whether `earlier` precedes `later` on one chain: strictly smaller
    /// time and chain containment.
    fn happens_before(earlier: &Self::Timestamp, later: &Self::Timestamp) -> bool;

    /// Writes the full tagged clock payload.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Reads one clock payload. Returns `Ok(None)` for the empty-slot
    /// sentinel used by vector packs for nodes that have never been
    /// primed.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on any structural violation.
    fn decode(reader: &mut Reader<'_>) -> Result<Option<Self>, ClockError>;

    /// Writes the empty-slot sentinel for this clock type.
    fn encode_empty_slot(buf: &mut Vec<u8>);

    /// Whether the chain still has unrevealed states, as far as this
    /// observer knows.
    fn can_be_updated(&self) -> bool {
        match self.lifetime() {
            None => true,
            Some(lifetime) => self.time() < i64::from(lifetime),
        }
    }

    /// Boolean form of [`Clock::check_timestamp`].
    fn verify_timestamp(&self, timestamp: &Self::Timestamp) -> bool {
        self.check_timestamp(timestamp).is_ok()
    }

    /// Strict advancement: like [`Clock::merge`] but a certificate that
    /// is not strictly newer than the current state is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidUpdate`] for stale, chain-invalid, or
    /// beyond-lifetime certificates and [`ClockError::InvalidSignature`]
    /// for a bad attached proof; on error the clock is unchanged.
    fn update(&mut self, timestamp: &Self::Timestamp) -> Result<(), ClockError> {
        if self.merge(timestamp)? {
            Ok(())
        } else {
            Err(ClockError::invalid_update(
                timestamp.time(),
                "certificate time is not later than the current state",
            ))
        }
    }

    /// Packs the clock into a tagged byte payload.
    fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Unpacks a clock packed by [`Clock::pack`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] for a wrong tag, truncation,
    /// trailing bytes, or an empty-slot sentinel outside a vector.
    fn unpack(data: &[u8]) -> Result<Self, ClockError> {
        let mut reader = Reader::new(data);
        let clock = Self::decode(&mut reader)?;
        reader.finish("clock payload")?;
        clock.ok_or_else(|| ClockError::bad_format("payload is an empty clock slot"))
    }
}

/// Owner side of a reverse-entropy chain: issues certificates from the
/// secret seed.
///
/// Updaters are immutable; they track no current time. Monotonicity is
/// enforced where state lives, on [`Clock::update`].
pub trait ClockUpdater: Clone + Sized {
    /// The observer type this updater feeds.
    type Clock: Clock;

    /// Wire tag of the packed updater.
    const WIRE_TAG: u8;

    /// The chain's public terminal element.
    fn uuid(&self) -> &[u8; 32];

    /// Number of advancements the chain supports.
    fn lifetime(&self) -> u32;

    /// Issues the certificate for `time`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] unless
    /// `0 <= time <= lifetime`.
    fn advance(&self, time: i64) -> Result<<Self::Clock as Clock>::Timestamp, ClockError>;

    /// Creates a fresh observer clock for this chain, at `(-1, uuid)`
    /// with the lifetime bound attached.
    fn clock(&self) -> Self::Clock;

    /// Writes the full tagged updater payload. The output contains the
    /// secret seed; treat it as sensitive and persist it locally only.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Reads one updater payload, re-deriving the uuid from the seed.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on any structural violation.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, ClockError>;

    /// Packs the updater into a tagged byte payload. Sensitive; see
    /// [`ClockUpdater::encode`].
    fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    /// Unpacks an updater packed by [`ClockUpdater::pack`].
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] for a wrong tag, truncation, or
    /// trailing bytes.
    fn unpack(data: &[u8]) -> Result<Self, ClockError> {
        let mut reader = Reader::new(data);
        let updater = Self::decode(&mut reader)?;
        reader.finish("updater payload")?;
        Ok(updater)
    }
}
