//! SHA-256 hash-chain clocks.
//!
//! The owner draws a random seed and hashes it `lifetime + 1` times; the
//! terminal digest is the clock's public uuid. Revealing the preimage at
//! depth `lifetime - t` advances the clock to time `t`. The reveal at
//! `t == lifetime` is the seed itself, at which point the chain is
//! provably exhausted and the clock has terminated.

use core::fmt;

use bytes::BufMut;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{Clock, ClockUpdater, Timestamp, MAX_SEED_SIZE, MAX_STATE_SIZE};
use crate::codec::{
    self, expect_tag, Reader, LIFETIME_UNKNOWN, TAG_HASH_CLOCK, TAG_HASH_UPDATER,
    TAG_VECTOR_HASH_TIMESTAMP,
};
use crate::crypto::hash;
use crate::error::ClockError;

/// Default seed size for hash-chain clocks, in bytes.
pub const HASH_CLOCK_SEED_SIZE: usize = 16;

/// Largest representable lifetime (`i32::MAX`), so every reachable time
/// fits the wire's signed time field.
pub const MAX_LIFETIME: u32 = 0x7FFF_FFFF;

/// A hash-chain timestamp certificate: `(time, H^(lifetime - time)(seed))`.
///
/// The digest is 32 bytes everywhere except the terminal certificate,
/// which reveals the seed itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashTimestamp {
    time: i64,
    digest: Vec<u8>,
}

impl HashTimestamp {
    /// Creates a certificate after validating field bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] when `time` is outside
    /// `[-1, i32::MAX]` or the digest is empty or oversized.
    pub fn new(time: i64, digest: impl Into<Vec<u8>>) -> Result<Self, ClockError> {
        let digest = digest.into();
        if time < -1 || time > i64::from(MAX_LIFETIME) {
            return Err(ClockError::invalid_argument(
                "timestamp time must be in [-1, i32::MAX]",
            ));
        }
        if digest.is_empty() || digest.len() > MAX_STATE_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "timestamp digest must be 1..={MAX_STATE_SIZE} bytes"
            )));
        }
        Ok(Self { time, digest })
    }

    /// The chain state backing the time claim.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl Timestamp for HashTimestamp {
    const VECTOR_TAG: u8 = TAG_VECTOR_HASH_TIMESTAMP;

    fn time(&self) -> i64 {
        self.time
    }

    fn encode_entry(&self, buf: &mut Vec<u8>) {
        codec::put_time(buf, self.time);
        // Constructor bounds the digest at MAX_STATE_SIZE.
        buf.put_u16(self.digest.len() as u16);
        buf.put_slice(&self.digest);
    }

    fn decode_entry(reader: &mut Reader<'_>) -> Result<Self, ClockError> {
        let time = codec::read_time(reader, "hash timestamp time")?;
        let len = reader.u16("hash timestamp digest length")? as usize;
        let digest = reader.take(len, "hash timestamp digest")?;
        Self::new(time, digest).map_err(|_| {
            ClockError::bad_format("hash timestamp fields out of bounds")
        })
    }
}

impl fmt::Display for HashTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, hex::encode(&self.digest))
    }
}

/// Observer of a SHA-256 hash chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashClock {
    uuid: [u8; 32],
    lifetime: Option<u32>,
    time: i64,
    digest: Vec<u8>,
}

impl HashClock {
    /// Sets up a fresh chain with the default seed size, returning the
    /// observer clock and the secret-holding updater.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] when `lifetime` exceeds
    /// [`MAX_LIFETIME`].
    pub fn setup(lifetime: u32) -> Result<(Self, HashClockUpdater), ClockError> {
        Self::setup_with_seed_size(lifetime, HASH_CLOCK_SEED_SIZE)
    }

    /// Sets up a fresh chain with an explicit seed size.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an out-of-range
    /// lifetime or seed size.
    pub fn setup_with_seed_size(
        lifetime: u32,
        seed_size: usize,
    ) -> Result<(Self, HashClockUpdater), ClockError> {
        let updater = HashClockUpdater::generate(lifetime, seed_size)?;
        Ok((updater.clock(), updater))
    }

    /// Creates an observer for a known chain uuid and declared lifetime.
    #[must_use]
    pub fn from_uuid(uuid: [u8; 32], lifetime: u32) -> Self {
        Self {
            uuid,
            lifetime: Some(lifetime.min(MAX_LIFETIME)),
            time: -1,
            digest: uuid.to_vec(),
        }
    }

    /// Whether the chain is provably exhausted: the clock has reached its
    /// declared lifetime and the seed itself has been revealed.
    #[must_use]
    pub fn has_terminated(&self) -> bool {
        self.lifetime
            .is_some_and(|lifetime| self.time == i64::from(lifetime))
    }
}

impl Clock for HashClock {
    type Timestamp = HashTimestamp;

    const WIRE_TAG: u8 = TAG_HASH_CLOCK;
    const VECTOR_WIRE_TAG: u8 = codec::TAG_VECTOR_HASH_CLOCK;

    fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn lifetime(&self) -> Option<u32> {
        self.lifetime
    }

    fn read(&self) -> HashTimestamp {
        HashTimestamp {
            time: self.time,
            digest: self.digest.clone(),
        }
    }

    fn check_timestamp(&self, timestamp: &HashTimestamp) -> Result<(), ClockError> {
        if let Some(lifetime) = self.lifetime {
            if timestamp.time > i64::from(lifetime) {
                return Err(ClockError::invalid_update(
                    timestamp.time,
                    format!("time exceeds the chain lifetime {lifetime}"),
                ));
            }
        }
        let rolled = hash::chain(&timestamp.digest, codec::gap(-1, timestamp.time));
        if hash::ct_eq(&rolled, &self.uuid) {
            Ok(())
        } else {
            Err(ClockError::invalid_update(
                timestamp.time,
                "digest does not chain to the clock uuid",
            ))
        }
    }

    fn merge(&mut self, timestamp: &HashTimestamp) -> Result<bool, ClockError> {
        if timestamp.time <= self.time {
            return Ok(false);
        }
        if let Some(lifetime) = self.lifetime {
            if timestamp.time > i64::from(lifetime) {
                tracing::debug!(
                    time = timestamp.time,
                    lifetime,
                    "rejected update beyond chain lifetime"
                );
                return Err(ClockError::invalid_update(
                    timestamp.time,
                    format!("time exceeds the chain lifetime {lifetime}"),
                ));
            }
        }
        let rolled = hash::chain(&timestamp.digest, codec::gap(self.time, timestamp.time));
        if !hash::ct_eq(&rolled, &self.digest) {
            tracing::debug!(time = timestamp.time, "rejected update off the chain");
            return Err(ClockError::invalid_update(
                timestamp.time,
                "digest does not chain to the current state",
            ));
        }
        self.time = timestamp.time;
        self.digest.clone_from(&timestamp.digest);
        Ok(true)
    }

    fn verify(&self) -> bool {
        let rolled = hash::chain(&self.digest, codec::gap(-1, self.time));
        hash::ct_eq(&rolled, &self.uuid)
    }

    fn observer(uuid: [u8; 32]) -> Self {
        Self {
            uuid,
            lifetime: None,
            time: -1,
            digest: uuid.to_vec(),
        }
    }

    fn from_timestamp(timestamp: &HashTimestamp) -> Result<Self, ClockError> {
        let uuid: [u8; 32] = if timestamp.time == -1 {
            timestamp.digest.as_slice().try_into().map_err(|_| {
                ClockError::invalid_update(-1, "origin certificate must carry the 32-byte uuid")
            })?
        } else {
            hash::chain_fixed(&timestamp.digest, codec::gap(-1, timestamp.time))
        };
        Ok(Self {
            uuid,
            lifetime: None,
            time: timestamp.time,
            digest: timestamp.digest.clone(),
        })
    }

    fn happens_before(earlier: &HashTimestamp, later: &HashTimestamp) -> bool {
        earlier.time < later.time
            && hash::ct_eq(
                &hash::chain(&later.digest, codec::gap(earlier.time, later.time)),
                &earlier.digest,
            )
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(self.lifetime.unwrap_or(LIFETIME_UNKNOWN));
        codec::put_time(buf, self.time);
        buf.put_slice(&self.uuid);
        buf.put_slice(&self.digest);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Option<Self>, ClockError> {
        expect_tag(reader, Self::WIRE_TAG, "hash clock")?;
        let lifetime = reader.u32("hash clock lifetime")?;
        let time = codec::read_time(reader, "hash clock time")?;
        let uuid = reader.array32("hash clock uuid")?;
        let digest = reader.rest();
        if lifetime == LIFETIME_UNKNOWN && time == -1 && uuid == [0u8; 32] && digest.is_empty() {
            return Ok(None);
        }
        if lifetime != LIFETIME_UNKNOWN && lifetime > MAX_LIFETIME {
            return Err(ClockError::bad_format("hash clock lifetime out of range"));
        }
        if uuid == [0u8; 32] {
            return Err(ClockError::bad_format("hash clock uuid is zero"));
        }
        if digest.is_empty() || digest.len() > MAX_STATE_SIZE {
            return Err(ClockError::bad_format("hash clock digest out of bounds"));
        }
        if lifetime != LIFETIME_UNKNOWN && time > i64::from(lifetime) {
            return Err(ClockError::bad_format("hash clock time exceeds lifetime"));
        }
        Ok(Some(Self {
            uuid,
            lifetime: (lifetime != LIFETIME_UNKNOWN).then_some(lifetime),
            time,
            digest: digest.to_vec(),
        }))
    }

    fn encode_empty_slot(buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(LIFETIME_UNKNOWN);
        codec::put_time(buf, -1);
        buf.put_slice(&[0u8; 32]);
    }
}

impl fmt::Display for HashClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time={}; uuid={}; state={}; terminated={}",
            self.time,
            hex::encode(self.uuid),
            hex::encode(&self.digest),
            self.has_terminated()
        )
    }
}

/// Owner of a hash chain: holds the secret seed and issues certificates.
#[derive(Clone)]
pub struct HashClockUpdater {
    seed: Zeroizing<Vec<u8>>,
    lifetime: u32,
    uuid: [u8; 32],
}

impl HashClockUpdater {
    /// Builds an updater from an explicit seed, walking the chain once to
    /// derive the uuid. Deterministic: the same seed and lifetime always
    /// produce the same chain.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an empty or oversized
    /// seed or a lifetime beyond [`MAX_LIFETIME`].
    pub fn from_seed(seed: &[u8], lifetime: u32) -> Result<Self, ClockError> {
        if seed.is_empty() || seed.len() > MAX_SEED_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "seed must be 1..={MAX_SEED_SIZE} bytes"
            )));
        }
        if lifetime > MAX_LIFETIME {
            return Err(ClockError::invalid_argument(
                "lifetime exceeds the representable maximum",
            ));
        }
        let uuid = hash::chain_fixed(seed, u64::from(lifetime) + 1);
        Ok(Self {
            seed: Zeroizing::new(seed.to_vec()),
            lifetime,
            uuid,
        })
    }

    /// Builds an updater over a fresh random seed.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an out-of-range seed
    /// size or lifetime.
    pub fn generate(lifetime: u32, seed_size: usize) -> Result<Self, ClockError> {
        if seed_size == 0 || seed_size > MAX_SEED_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "seed size must be 1..={MAX_SEED_SIZE}"
            )));
        }
        let mut seed = Zeroizing::new(vec![0u8; seed_size]);
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(&seed, lifetime)
    }

    /// The seed bytes. Secret: exposing these lets anyone forge the full
    /// chain.
    #[must_use]
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }
}

impl ClockUpdater for HashClockUpdater {
    type Clock = HashClock;

    const WIRE_TAG: u8 = TAG_HASH_UPDATER;

    fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    fn lifetime(&self) -> u32 {
        self.lifetime
    }

    fn advance(&self, time: i64) -> Result<HashTimestamp, ClockError> {
        if time < 0 || time > i64::from(self.lifetime) {
            return Err(ClockError::invalid_argument(format!(
                "advancement time must be in [0, {}]",
                self.lifetime
            )));
        }
        Ok(HashTimestamp {
            time,
            digest: hash::chain(&self.seed, codec::gap(time, i64::from(self.lifetime))),
        })
    }

    fn clock(&self) -> HashClock {
        HashClock::from_uuid(self.uuid, self.lifetime)
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(self.lifetime);
        // from_seed bounds the seed at MAX_SEED_SIZE.
        buf.put_u16(self.seed.len() as u16);
        buf.put_slice(&self.seed);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, ClockError> {
        expect_tag(reader, Self::WIRE_TAG, "hash clock updater")?;
        let lifetime = reader.u32("updater lifetime")?;
        let seed_len = reader.u16("updater seed length")? as usize;
        let seed = reader.take(seed_len, "updater seed")?;
        Self::from_seed(seed, lifetime)
            .map_err(|_| ClockError::bad_format("updater fields out of bounds"))
    }
}

impl PartialEq for HashClockUpdater {
    fn eq(&self, other: &Self) -> bool {
        self.lifetime == other.lifetime && hash::ct_eq(&self.seed, &other.seed)
    }
}

impl fmt::Debug for HashClockUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashClockUpdater")
            .field("lifetime", &self.lifetime)
            .field("uuid", &hex::encode(self.uuid))
            .field("seed", &"<redacted>")
            .finish()
    }
}
