//! Ed25519 point-chain clocks with signed timestamps.
//!
//! The owner hashes a random seed into a secret scalar, derives its public
//! point, and walks `next_point` forward `lifetime + 1` times; the terminal
//! point is the clock's uuid. Because the secret-side chain
//! (`next_scalar`) commutes with key derivation, the owner can also sign a
//! message under the scalar matching any revealed point, and observers
//! verify the signature against the certificate itself.
//!
//! Unlike the hash chain there is no preimage-exhaustion argument: the
//! chain is well-defined at any depth, so the lifetime is enforced purely
//! as policy and the clock has no notion of provable termination.

use core::fmt;

use bytes::BufMut;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{Clock, ClockUpdater, Timestamp, MAX_SEED_SIZE};
use crate::codec::{
    self, expect_tag, Reader, LIFETIME_UNKNOWN, TAG_POINT_CLOCK, TAG_POINT_UPDATER,
    TAG_VECTOR_POINT_TIMESTAMP,
};
use crate::crypto::hash;
use crate::crypto::point::{self, POINT_SIZE, SIGNATURE_SIZE};
use crate::error::ClockError;

use super::hash_clock::MAX_LIFETIME;

/// Default seed size for point-chain clocks, in bytes.
pub const POINT_CLOCK_SEED_SIZE: usize = 32;

/// Largest message a signed timestamp may carry, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

mod signature_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::SIGNATURE_SIZE;

    pub fn serialize<S>(bytes: &[u8; SIGNATURE_SIZE], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bytes.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; SIGNATURE_SIZE], D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<u8>::deserialize(deserializer)?;
        if vec.len() != SIGNATURE_SIZE {
            return Err(serde::de::Error::custom(format!(
                "expected {} bytes for signature, got {}",
                SIGNATURE_SIZE,
                vec.len()
            )));
        }
        let mut arr = [0u8; SIGNATURE_SIZE];
        arr.copy_from_slice(&vec);
        Ok(arr)
    }
}

/// A message and the Ed25519 signature binding it to a chain point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageProof {
    message: Vec<u8>,
    #[serde(with = "signature_serde")]
    signature: [u8; SIGNATURE_SIZE],
}

impl MessageProof {
    /// Creates a proof after validating message bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an empty or oversized
    /// message.
    pub fn new(
        message: impl Into<Vec<u8>>,
        signature: [u8; SIGNATURE_SIZE],
    ) -> Result<Self, ClockError> {
        let message = message.into();
        if message.is_empty() || message.len() > MAX_MESSAGE_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "signed message must be 1..={MAX_MESSAGE_SIZE} bytes"
            )));
        }
        Ok(Self { message, signature })
    }

    /// The signed message.
    #[must_use]
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// The signature over the message.
    #[must_use]
    pub fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.signature
    }
}

/// A point-chain timestamp certificate:
/// `(time, next_point^(lifetime - time)(p0))`, optionally carrying a
/// message signed under the scalar matching the revealed point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTimestamp {
    time: i64,
    point: [u8; POINT_SIZE],
    proof: Option<MessageProof>,
}

impl PointTimestamp {
    /// Creates a bare certificate after validating the time bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] when `time` is outside
    /// `[-1, i32::MAX]`.
    pub fn new(time: i64, point: [u8; POINT_SIZE]) -> Result<Self, ClockError> {
        if time < -1 || time > i64::from(MAX_LIFETIME) {
            return Err(ClockError::invalid_argument(
                "timestamp time must be in [-1, i32::MAX]",
            ));
        }
        Ok(Self {
            time,
            point,
            proof: None,
        })
    }

    /// Creates a signed certificate.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an out-of-range time
    /// or message.
    pub fn new_signed(
        time: i64,
        point: [u8; POINT_SIZE],
        message: impl Into<Vec<u8>>,
        signature: [u8; SIGNATURE_SIZE],
    ) -> Result<Self, ClockError> {
        let mut timestamp = Self::new(time, point)?;
        timestamp.proof = Some(MessageProof::new(message, signature)?);
        Ok(timestamp)
    }

    /// The chain point backing the time claim.
    #[must_use]
    pub fn point(&self) -> &[u8; POINT_SIZE] {
        &self.point
    }

    /// The attached signature proof, if this certificate is signed.
    #[must_use]
    pub fn proof(&self) -> Option<&MessageProof> {
        self.proof.as_ref()
    }
}

impl Timestamp for PointTimestamp {
    const VECTOR_TAG: u8 = TAG_VECTOR_POINT_TIMESTAMP;

    fn time(&self) -> i64 {
        self.time
    }

    fn encode_entry(&self, buf: &mut Vec<u8>) {
        codec::put_time(buf, self.time);
        buf.put_slice(&self.point);
        match &self.proof {
            None => buf.put_u8(0),
            Some(proof) => {
                buf.put_u8(1);
                // MessageProof bounds the message at MAX_MESSAGE_SIZE.
                buf.put_u32(proof.message.len() as u32);
                buf.put_slice(&proof.message);
                buf.put_slice(&proof.signature);
            }
        }
    }

    fn decode_entry(reader: &mut Reader<'_>) -> Result<Self, ClockError> {
        let time = codec::read_time(reader, "point timestamp time")?;
        let point = reader.array32("point timestamp point")?;
        let mut timestamp = Self::new(time, point)
            .map_err(|_| ClockError::bad_format("point timestamp time out of bounds"))?;
        match reader.u8("point timestamp proof flag")? {
            0 => {}
            1 => {
                let len = reader.u32("signed message length")? as usize;
                if len == 0 || len > MAX_MESSAGE_SIZE {
                    return Err(ClockError::bad_format("signed message length out of bounds"));
                }
                let message = reader.take(len, "signed message")?;
                let signature = reader.array64("timestamp signature")?;
                timestamp.proof = Some(MessageProof {
                    message: message.to_vec(),
                    signature,
                });
            }
            other => {
                return Err(ClockError::bad_format(format!(
                    "invalid proof flag {other:#04x}"
                )));
            }
        }
        Ok(timestamp)
    }
}

impl fmt::Display for PointTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, signed={})",
            self.time,
            hex::encode(self.point),
            self.proof.is_some()
        )
    }
}

/// Observer of an Ed25519 point chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointClock {
    uuid: [u8; 32],
    lifetime: Option<u32>,
    time: i64,
    point: [u8; POINT_SIZE],
}

impl PointClock {
    /// Sets up a fresh chain with the default seed size, returning the
    /// observer clock and the secret-holding updater.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] when `lifetime` exceeds
    /// [`MAX_LIFETIME`].
    pub fn setup(lifetime: u32) -> Result<(Self, PointClockUpdater), ClockError> {
        Self::setup_with_seed_size(lifetime, POINT_CLOCK_SEED_SIZE)
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
    ) -> Result<(Self, PointClockUpdater), ClockError> {
        let updater = PointClockUpdater::generate(lifetime, seed_size)?;
        Ok((updater.clock(), updater))
    }

    /// Creates an observer for a known chain uuid and declared lifetime.
    #[must_use]
    pub fn from_uuid(uuid: [u8; 32], lifetime: u32) -> Self {
        Self {
            uuid,
            lifetime: Some(lifetime.min(MAX_LIFETIME)),
            time: -1,
            point: uuid,
        }
    }

    /// Verifies a signed certificate end to end: chain containment,
    /// signature validity, and an exact match against the expected
    /// message.
    #[must_use]
    pub fn verify_signed_timestamp(
        &self,
        timestamp: &PointTimestamp,
        expected_message: &[u8],
    ) -> bool {
        let Some(proof) = &timestamp.proof else {
            return false;
        };
        proof.message == expected_message && self.check_timestamp(timestamp).is_ok()
    }
}

impl Clock for PointClock {
    type Timestamp = PointTimestamp;

    const WIRE_TAG: u8 = TAG_POINT_CLOCK;
    const VECTOR_WIRE_TAG: u8 = codec::TAG_VECTOR_POINT_CLOCK;

    fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn lifetime(&self) -> Option<u32> {
        self.lifetime
    }

    fn read(&self) -> PointTimestamp {
        PointTimestamp {
            time: self.time,
            point: self.point,
            proof: None,
        }
    }

    fn check_timestamp(&self, timestamp: &PointTimestamp) -> Result<(), ClockError> {
        if let Some(lifetime) = self.lifetime {
            if timestamp.time > i64::from(lifetime) {
                return Err(ClockError::invalid_update(
                    timestamp.time,
                    format!("time exceeds the chain lifetime {lifetime}"),
                ));
            }
        }
        let rolled = point::chain(&timestamp.point, codec::gap(-1, timestamp.time))
            .map_err(|_| ClockError::invalid_update(timestamp.time, "state is not a curve point"))?;
        if !hash::ct_eq(&rolled, &self.uuid) {
            return Err(ClockError::invalid_update(
                timestamp.time,
                "point does not chain to the clock uuid",
            ));
        }
        verify_proof(timestamp)
    }

    fn merge(&mut self, timestamp: &PointTimestamp) -> Result<bool, ClockError> {
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
        let rolled = point::chain(&timestamp.point, codec::gap(self.time, timestamp.time))
            .map_err(|_| ClockError::invalid_update(timestamp.time, "state is not a curve point"))?;
        if !hash::ct_eq(&rolled, &self.point) {
            tracing::debug!(time = timestamp.time, "rejected update off the chain");
            return Err(ClockError::invalid_update(
                timestamp.time,
                "point does not chain to the current state",
            ));
        }
        verify_proof(timestamp)?;
        self.time = timestamp.time;
        self.point = timestamp.point;
        Ok(true)
    }

    fn verify(&self) -> bool {
        point::chain(&self.point, codec::gap(-1, self.time))
            .is_ok_and(|rolled| hash::ct_eq(&rolled, &self.uuid))
    }

    fn observer(uuid: [u8; 32]) -> Self {
        Self {
            uuid,
            lifetime: None,
            time: -1,
            point: uuid,
        }
    }

    fn from_timestamp(timestamp: &PointTimestamp) -> Result<Self, ClockError> {
        verify_proof(timestamp)?;
        let uuid = point::chain(&timestamp.point, codec::gap(-1, timestamp.time))
            .map_err(|_| ClockError::invalid_update(timestamp.time, "state is not a curve point"))?;
        Ok(Self {
            uuid,
            lifetime: None,
            time: timestamp.time,
            point: timestamp.point,
        })
    }

    fn happens_before(earlier: &PointTimestamp, later: &PointTimestamp) -> bool {
        earlier.time < later.time
            && point::chain(&later.point, codec::gap(earlier.time, later.time))
                .is_ok_and(|rolled| hash::ct_eq(&rolled, &earlier.point))
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(self.lifetime.unwrap_or(LIFETIME_UNKNOWN));
        codec::put_time(buf, self.time);
        buf.put_slice(&self.uuid);
        buf.put_slice(&self.point);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Option<Self>, ClockError> {
        expect_tag(reader, Self::WIRE_TAG, "point clock")?;
        let lifetime = reader.u32("point clock lifetime")?;
        let time = codec::read_time(reader, "point clock time")?;
        let uuid = reader.array32("point clock uuid")?;
        let point = reader.array32("point clock state")?;
        if lifetime == LIFETIME_UNKNOWN && time == -1 && uuid == [0u8; 32] && point == [0u8; 32] {
            return Ok(None);
        }
        if lifetime != LIFETIME_UNKNOWN && lifetime > MAX_LIFETIME {
            return Err(ClockError::bad_format("point clock lifetime out of range"));
        }
        if uuid == [0u8; 32] {
            return Err(ClockError::bad_format("point clock uuid is zero"));
        }
        if lifetime != LIFETIME_UNKNOWN && time > i64::from(lifetime) {
            return Err(ClockError::bad_format("point clock time exceeds lifetime"));
        }
        Ok(Some(Self {
            uuid,
            lifetime: (lifetime != LIFETIME_UNKNOWN).then_some(lifetime),
            time,
            point,
        }))
    }

    fn encode_empty_slot(buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(LIFETIME_UNKNOWN);
        codec::put_time(buf, -1);
        buf.put_slice(&[0u8; 64]);
    }
}

impl fmt::Display for PointClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time={}; uuid={}; state={}",
            self.time,
            hex::encode(self.uuid),
            hex::encode(self.point)
        )
    }
}

fn verify_proof(timestamp: &PointTimestamp) -> Result<(), ClockError> {
    if let Some(proof) = &timestamp.proof {
        if !point::verify_signature(&timestamp.point, &proof.message, &proof.signature) {
            tracing::debug!(time = timestamp.time, "rejected signed update: bad signature");
            return Err(ClockError::InvalidSignature {
                time: timestamp.time,
            });
        }
    }
    Ok(())
}

/// Owner of a point chain: holds the secret seed and issues bare or
/// signed certificates.
#[derive(Clone)]
pub struct PointClockUpdater {
    seed: Zeroizing<Vec<u8>>,
    lifetime: u32,
    uuid: [u8; 32],
}

impl PointClockUpdater {
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
        let origin = point::derive(&point::scalar_from_seed(seed));
        let uuid = point::chain(&origin, u64::from(lifetime) + 1)
            .map_err(|_| ClockError::invalid_argument("seed derives an invalid chain point"))?;
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

    /// Issues a signed certificate for `time`: the chain point at that
    /// depth plus a signature over `message` under the matching secret
    /// scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for an out-of-range time
    /// or an empty or oversized message.
    pub fn advance_and_sign(
        &self,
        time: i64,
        message: &[u8],
    ) -> Result<PointTimestamp, ClockError> {
        self.check_advance(time)?;
        if message.is_empty() || message.len() > MAX_MESSAGE_SIZE {
            return Err(ClockError::invalid_argument(format!(
                "signed message must be 1..={MAX_MESSAGE_SIZE} bytes"
            )));
        }
        let scalar = point::scalar_chain(
            &point::scalar_from_seed(&self.seed),
            codec::gap(time, i64::from(self.lifetime)),
        );
        let point = point::derive(&scalar);
        let signature = point::sign_with_scalar(&scalar, message)
            .map_err(|_| ClockError::invalid_argument("chain scalar derives an invalid key"))?;
        PointTimestamp::new_signed(time, point, message, signature)
    }

    fn check_advance(&self, time: i64) -> Result<(), ClockError> {
        if time < 0 || time > i64::from(self.lifetime) {
            return Err(ClockError::invalid_argument(format!(
                "advancement time must be in [0, {}]",
                self.lifetime
            )));
        }
        Ok(())
    }

    /// The seed bytes. Secret: exposing these lets anyone forge the full
    /// chain and its signatures.
    #[must_use]
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }
}

impl ClockUpdater for PointClockUpdater {
    type Clock = PointClock;

    const WIRE_TAG: u8 = TAG_POINT_UPDATER;

    fn uuid(&self) -> &[u8; 32] {
        &self.uuid
    }

    fn lifetime(&self) -> u32 {
        self.lifetime
    }

    fn advance(&self, time: i64) -> Result<PointTimestamp, ClockError> {
        self.check_advance(time)?;
        let origin = point::derive(&point::scalar_from_seed(&self.seed));
        let state = point::chain(&origin, codec::gap(time, i64::from(self.lifetime)))
            .map_err(|_| ClockError::invalid_argument("seed derives an invalid chain point"))?;
        PointTimestamp::new(time, state)
    }

    fn clock(&self) -> PointClock {
        PointClock::from_uuid(self.uuid, self.lifetime)
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_u8(Self::WIRE_TAG);
        buf.put_u32(self.lifetime);
        // from_seed bounds the seed at MAX_SEED_SIZE.
        buf.put_u16(self.seed.len() as u16);
        buf.put_slice(&self.seed);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, ClockError> {
        expect_tag(reader, Self::WIRE_TAG, "point clock updater")?;
        let lifetime = reader.u32("updater lifetime")?;
        let seed_len = reader.u16("updater seed length")? as usize;
        let seed = reader.take(seed_len, "updater seed")?;
        Self::from_seed(seed, lifetime)
            .map_err(|_| ClockError::bad_format("updater fields out of bounds"))
    }
}

impl PartialEq for PointClockUpdater {
    fn eq(&self, other: &Self) -> bool {
        self.lifetime == other.lifetime && hash::ct_eq(&self.seed, &other.seed)
    }
}

impl fmt::Debug for PointClockUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointClockUpdater")
            .field("lifetime", &self.lifetime)
            .field("uuid", &hex::encode(self.uuid))
            .field("seed", &"<redacted>")
            .finish()
    }
}
