//! SHA-256 digests and recursive hash chains.
//!
//! A chain of depth `n` over input `x` is `H^n(x)`: SHA-256 applied `n`
//! times, where `H^0(x) = x`. Chains are the one-way skeleton of every
//! hash clock: the owner walks the chain forward once at setup and reveals
//! intermediate states in reverse.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Size in bytes of a SHA-256 digest.
pub const HASH_SIZE: usize = 32;

/// Computes the SHA-256 digest of `data`.
#[must_use]
pub fn digest(data: &[u8]) -> [u8; HASH_SIZE] {
    Sha256::digest(data).into()
}

/// Applies SHA-256 to `data` `steps` times.
///
/// `chain(x, 0)` is a copy of `x` (which may be any length, e.g. a
/// 16-byte seed); for `steps >= 1` the result is always 32 bytes.
#[must_use]
pub fn chain(data: &[u8], steps: u64) -> Vec<u8> {
    if steps == 0 {
        return data.to_vec();
    }
    chain_fixed(data, steps).to_vec()
}

/// Applies SHA-256 to `data` `steps` times, `steps >= 1`, yielding the
/// fixed-size digest directly.
#[must_use]
pub fn chain_fixed(data: &[u8], steps: u64) -> [u8; HASH_SIZE] {
    debug_assert!(steps >= 1, "chain_fixed requires at least one step");
    let mut acc = digest(data);
    for _ in 1..steps {
        acc = digest(&acc);
    }
    acc
}

/// Constant-time byte-string equality.
///
/// Length is compared in variable time (lengths are public); content is
/// compared in constant time.
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_zero_steps_is_identity() {
        let seed = [0u8; 16];
        assert_eq!(chain(&seed, 0), seed.to_vec());
    }

    #[test]
    fn chain_composes() {
        let seed = b"chain composition input";
        let full = chain(seed, 5);
        let half = chain(seed, 2);
        assert_eq!(chain(&half, 3), full);
    }

    #[test]
    fn chain_matches_manual_hashing() {
        let seed = [7u8; 16];
        let once = digest(&seed);
        let twice = digest(&once);
        assert_eq!(chain(&seed, 1), once.to_vec());
        assert_eq!(chain(&seed, 2), twice.to_vec());
        assert_eq!(chain_fixed(&seed, 2), twice);
    }

    #[test]
    fn ct_eq_rejects_length_mismatch() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abcd"));
        assert!(!ct_eq(b"abc", b"abd"));
    }
}
