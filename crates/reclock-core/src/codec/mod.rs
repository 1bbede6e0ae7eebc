//! Length-prefixed binary codec shared by every packable type.
//!
//! Each payload is a single type tag followed by big-endian fields. The
//! tag space is flat across all variants so a payload unpacked as the
//! wrong type is rejected instead of misparsed. Decoding is bounds-checked
//! before any slice is taken; truncated buffers, trailing bytes, unknown
//! tags, and inner decode failures all surface as
//! [`ClockError::BadFormat`].

use crate::clock::{
    Clock, ClockUpdater, HashClock, HashClockUpdater, PointClock, PointClockUpdater,
};
use crate::error::ClockError;
use crate::vector::{VectorHashClock, VectorPointClock};

/// Tag for a packed [`HashClock`].
pub const TAG_HASH_CLOCK: u8 = 0x01;
/// Tag for a packed [`HashClockUpdater`].
pub const TAG_HASH_UPDATER: u8 = 0x02;
/// Tag for a packed [`PointClock`].
pub const TAG_POINT_CLOCK: u8 = 0x03;
/// Tag for a packed [`PointClockUpdater`].
pub const TAG_POINT_UPDATER: u8 = 0x04;
/// Tag for a packed [`VectorHashClock`].
pub const TAG_VECTOR_HASH_CLOCK: u8 = 0x05;
/// Tag for a packed [`VectorPointClock`].
pub const TAG_VECTOR_POINT_CLOCK: u8 = 0x06;
/// Tag for a packed vector timestamp over hash certificates.
pub const TAG_VECTOR_HASH_TIMESTAMP: u8 = 0x07;
/// Tag for a packed vector timestamp over point certificates.
pub const TAG_VECTOR_POINT_TIMESTAMP: u8 = 0x08;

/// Wire sentinel for a lifetime that is unknown to the holder.
///
/// Real lifetimes are capped at `i32::MAX` by setup, so the sentinel can
/// never collide with a declared bound.
pub const LIFETIME_UNKNOWN: u32 = u32::MAX;

/// Bounds-checked cursor over a packed payload.
///
/// Every read validates the remaining length before taking bytes, so a
/// hostile length prefix can never cause an out-of-range slice or an
/// allocation larger than the buffer that was actually received.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `buf` positioned at the start.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Takes the next `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], ClockError> {
        if self.remaining() < len {
            return Err(ClockError::bad_format(format!(
                "truncated {what}: need {len} bytes, have {}",
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Takes every remaining byte.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn u8(&mut self, what: &str) -> Result<u8, ClockError> {
        Ok(self.take(1, what)?[0])
    }

    /// Reads a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn u16(&mut self, what: &str) -> Result<u16, ClockError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn u32(&mut self, what: &str) -> Result<u32, ClockError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn i32(&mut self, what: &str) -> Result<i32, ClockError> {
        let bytes = self.take(4, what)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a fixed 32-byte field.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn array32(&mut self, what: &str) -> Result<[u8; 32], ClockError> {
        let bytes = self.take(32, what)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads a fixed 64-byte field.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] on truncation.
    pub fn array64(&mut self, what: &str) -> Result<[u8; 64], ClockError> {
        let bytes = self.take(64, what)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Asserts the payload was consumed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::BadFormat`] if bytes remain.
    pub fn finish(self, what: &str) -> Result<(), ClockError> {
        if self.remaining() > 0 {
            return Err(ClockError::bad_format(format!(
                "{what} carries {} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}

/// Reads and checks a payload's type tag.
///
/// # Errors
///
/// Returns [`ClockError::BadFormat`] on truncation or tag mismatch.
pub fn expect_tag(reader: &mut Reader<'_>, tag: u8, what: &str) -> Result<(), ClockError> {
    let got = reader.u8(what)?;
    if got != tag {
        return Err(ClockError::bad_format(format!(
            "wrong tag for {what}: expected {tag:#04x}, got {got:#04x}"
        )));
    }
    Ok(())
}

/// Writes a clock time as the wire's `i32`.
///
/// Callers maintain `time ∈ [−1, i32::MAX]` (setup caps lifetimes at
/// `i32::MAX` and certificate constructors validate their time), so the
/// narrowing below is lossless.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn put_time(buf: &mut Vec<u8>, time: i64) {
    bytes::BufMut::put_i32(buf, time as i32);
}

/// Reads a wire time and validates its floor.
pub(crate) fn read_time(reader: &mut Reader<'_>, what: &str) -> Result<i64, ClockError> {
    let time = i64::from(reader.i32(what)?);
    if time < -1 {
        return Err(ClockError::bad_format(format!("{what} is below -1")));
    }
    Ok(time)
}

/// Number of one-way steps between two times, for `from <= to`.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn gap(from: i64, to: i64) -> u64 {
    debug_assert!(from <= to);
    to.saturating_sub(from).max(0) as u64
}

/// Any payload the codec can produce, for callers that dispatch on the
/// tag instead of knowing the type up front.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A hash-chain clock.
    HashClock(HashClock),
    /// A hash-chain clock updater. Contains the secret seed.
    HashClockUpdater(HashClockUpdater),
    /// A point-chain clock.
    PointClock(PointClock),
    /// A point-chain clock updater. Contains the secret seed.
    PointClockUpdater(PointClockUpdater),
    /// A vector of hash-chain clocks.
    VectorHashClock(VectorHashClock),
    /// A vector of point-chain clocks.
    VectorPointClock(VectorPointClock),
}

/// Unpacks any tagged clock or updater payload.
///
/// # Errors
///
/// Returns [`ClockError::BadFormat`] for an empty buffer, an unknown tag,
/// or any inner decode failure.
pub fn unpack(data: &[u8]) -> Result<Envelope, ClockError> {
    let tag = data
        .first()
        .copied()
        .ok_or_else(|| ClockError::bad_format("empty payload"))?;
    match tag {
        TAG_HASH_CLOCK => Ok(Envelope::HashClock(HashClock::unpack(data)?)),
        TAG_HASH_UPDATER => Ok(Envelope::HashClockUpdater(HashClockUpdater::unpack(data)?)),
        TAG_POINT_CLOCK => Ok(Envelope::PointClock(PointClock::unpack(data)?)),
        TAG_POINT_UPDATER => Ok(Envelope::PointClockUpdater(PointClockUpdater::unpack(
            data,
        )?)),
        TAG_VECTOR_HASH_CLOCK => Ok(Envelope::VectorHashClock(VectorHashClock::unpack(data)?)),
        TAG_VECTOR_POINT_CLOCK => Ok(Envelope::VectorPointClock(VectorPointClock::unpack(data)?)),
        other => Err(ClockError::bad_format(format!(
            "unknown payload tag {other:#04x}"
        ))),
    }
}
