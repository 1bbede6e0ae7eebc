//! Ed25519 point chains and raw-scalar signing.
//!
//! The point chain is the Ed25519 analogue of the hash chain: one step is
//! `next_point(p) = p + [clamp(H(p))]G`, which only the holder of the
//! running secret scalar can invert. The matching secret-side step is
//! `next_scalar(s) = s + clamp(H([s]G))`, and the two commute with key
//! derivation:
//!
//! ```text
//! derive(next_scalar(s)) == next_point(derive(s))
//! ```
//!
//! That identity is what lets an updater both reveal chain points and sign
//! messages under the scalar matching any revealed point. Unlike the hash
//! chain there is no exhaustion argument here: the chain is well-defined at
//! any depth, so lifetimes are enforced as policy by the clocks.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::{clamp_integer, Scalar};
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::Sha512;
use thiserror::Error;

use super::hash;

/// Size in bytes of a compressed Edwards point.
pub const POINT_SIZE: usize = 32;

/// Size in bytes of an Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// Domain separator mixed into the deterministic signing nonce.
const NONCE_DOMAIN: &[u8] = b"reclock:point-chain:nonce:v1\0";

/// A 32-byte string that is not a valid compressed Edwards point.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid Ed25519 point encoding")]
pub struct InvalidPoint;

/// Reduces 32 bytes to a canonical scalar via standard Ed25519 clamping.
#[must_use]
pub fn clamp(bytes: [u8; 32]) -> Scalar {
    Scalar::from_bytes_mod_order(clamp_integer(bytes))
}

/// Derives the secret chain origin from a seed: `clamp(H(seed))`.
#[must_use]
pub fn scalar_from_seed(seed: &[u8]) -> Scalar {
    clamp(hash::digest(seed))
}

/// Base-point scalar multiplication, compressed.
#[must_use]
pub fn derive(scalar: &Scalar) -> [u8; POINT_SIZE] {
    EdwardsPoint::mul_base(scalar).compress().to_bytes()
}

fn decompress(point: &[u8; POINT_SIZE]) -> Result<EdwardsPoint, InvalidPoint> {
    CompressedEdwardsY(*point).decompress().ok_or(InvalidPoint)
}

/// Edwards point addition over compressed encodings.
///
/// # Errors
///
/// Returns [`InvalidPoint`] if either operand does not decode to a curve
/// point.
pub fn add(
    p: &[u8; POINT_SIZE],
    q: &[u8; POINT_SIZE],
) -> Result<[u8; POINT_SIZE], InvalidPoint> {
    Ok((decompress(p)? + decompress(q)?).compress().to_bytes())
}

/// One public chain step: `p + [clamp(H(p))]G`.
///
/// # Errors
///
/// Returns [`InvalidPoint`] if `p` does not decode to a curve point.
pub fn next_point(p: &[u8; POINT_SIZE]) -> Result<[u8; POINT_SIZE], InvalidPoint> {
    let point = decompress(p)?;
    let step = clamp(hash::digest(p));
    Ok((point + EdwardsPoint::mul_base(&step)).compress().to_bytes())
}

/// One secret chain step: `s + clamp(H([s]G))`, reduced mod the group
/// order.
#[must_use]
pub fn next_scalar(s: &Scalar) -> Scalar {
    s + clamp(hash::digest(&derive(s)))
}

/// Applies [`next_point`] `steps` times.
///
/// # Errors
///
/// Returns [`InvalidPoint`] if any intermediate encoding fails to decode;
/// for points produced by this module the chain never fails.
pub fn chain(p: &[u8; POINT_SIZE], steps: u64) -> Result<[u8; POINT_SIZE], InvalidPoint> {
    let mut acc = *p;
    for _ in 0..steps {
        acc = next_point(&acc)?;
    }
    Ok(acc)
}

/// Applies [`next_scalar`] `steps` times.
#[must_use]
pub fn scalar_chain(s: &Scalar, steps: u64) -> Scalar {
    let mut acc = *s;
    for _ in 0..steps {
        acc = next_scalar(&acc);
    }
    acc
}

/// Signs `message` under a bare chain scalar.
///
/// Chain scalars are not derived the way `ed25519-dalek` expands seed keys,
/// so signing goes through the hazmat interface with the scalar installed
/// directly. The nonce prefix is derived deterministically from the scalar
/// under a domain separator; verification is standard Ed25519 against
/// `derive(scalar)` and needs no knowledge of the prefix.
///
/// # Errors
///
/// Returns [`InvalidPoint`] if the derived public point is rejected by the
/// verifier construction (unreachable for scalars produced by this module).
pub fn sign_with_scalar(
    scalar: &Scalar,
    message: &[u8],
) -> Result<[u8; SIGNATURE_SIZE], InvalidPoint> {
    let public = derive(scalar);
    let verifying_key = VerifyingKey::from_bytes(&public).map_err(|_| InvalidPoint)?;
    let expanded = ExpandedSecretKey {
        scalar: *scalar,
        hash_prefix: nonce_prefix(scalar),
    };
    let signature = raw_sign::<Sha512>(&expanded, message, &verifying_key);
    Ok(signature.to_bytes())
}

/// Verifies an Ed25519 signature against a compressed point used as the
/// public key. Any decode failure is reported as a plain `false`.
#[must_use]
pub fn verify_signature(
    point: &[u8; POINT_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(point) else {
        return false;
    };
    let signature = Signature::from_bytes(signature);
    verifying_key.verify(message, &signature).is_ok()
}

fn nonce_prefix(scalar: &Scalar) -> [u8; 32] {
    let mut input = Vec::with_capacity(NONCE_DOMAIN.len() + 32);
    input.extend_from_slice(NONCE_DOMAIN);
    input.extend_from_slice(&scalar.to_bytes());
    hash::digest(&input)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn scalar_and_point_steps_commute() {
        let s = scalar_from_seed(b"commutation seed");
        let lhs = derive(&next_scalar(&s));
        let rhs = next_point(&derive(&s)).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn chains_commute_over_depth() {
        let s = scalar_from_seed(&[3u8; 32]);
        let p = derive(&s);
        for depth in [0u64, 1, 2, 7] {
            let lhs = derive(&scalar_chain(&s, depth));
            let rhs = chain(&p, depth).unwrap();
            assert_eq!(lhs, rhs, "divergence at depth {depth}");
        }
    }

    #[test]
    fn next_point_matches_primitive_addition() {
        let p = derive(&scalar_from_seed(b"addition"));
        let step = derive(&clamp(hash::digest(&p)));
        assert_eq!(next_point(&p).unwrap(), add(&p, &step).unwrap());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let s = scalar_chain(&scalar_from_seed(b"signing seed"), 4);
        let p = derive(&s);
        let sig = sign_with_scalar(&s, b"hello").unwrap();
        assert!(verify_signature(&p, b"hello", &sig));
        assert!(!verify_signature(&p, b"world", &sig));
    }

    #[test]
    fn signature_bound_to_point() {
        let s = scalar_from_seed(b"one scalar");
        let other = derive(&scalar_from_seed(b"another scalar"));
        let sig = sign_with_scalar(&s, b"msg").unwrap();
        assert!(!verify_signature(&other, b"msg", &sig));
    }

    #[test]
    fn non_point_encodings_are_rejected() {
        // 0xff..ff has a y coordinate outside the field.
        let junk = [0xffu8; POINT_SIZE];
        assert!(next_point(&junk).is_err());
        assert!(add(&junk, &junk).is_err());
    }

    proptest! {
        #[test]
        fn derivation_commutes_for_random_scalars(bytes in any::<[u8; 32]>()) {
            let s = clamp(bytes);
            prop_assert_eq!(derive(&next_scalar(&s)), next_point(&derive(&s)).unwrap());
        }

        #[test]
        fn signatures_verify_for_random_scalars(bytes in any::<[u8; 32]>(), msg in proptest::collection::vec(any::<u8>(), 1..64)) {
            let s = clamp(bytes);
            let sig = sign_with_scalar(&s, &msg).unwrap();
            prop_assert!(verify_signature(&derive(&s), &msg, &sig));
        }
    }
}
