// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Signing phase: each party turns its presigned nonce share into a partial
// signature over the message hash; the aggregator sums them into a standard
// secp256k1 (r, s) signature and verifies it before returning.

use crate::curve::{Point, Scalar};
use crate::error::{Result, ThresholdError};
use sha2::{Digest, Sha256};

/// A 64-byte secp256k1 signature, `s` normalized to its low representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: Scalar,
    pub s: Scalar,
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }
}

/// `H(m)` reduced mod `N`, interpreted as a scalar.
pub fn hash_message(message: &[u8]) -> Scalar {
    let digest = Sha256::digest(message);
    Scalar::from_bytes_mod_order(&digest)
}

/// `sigma_i = r*chi_i + H(m)*k_i mod N`.
pub fn partial_signature(r: &Scalar, chi: &Scalar, k: &Scalar, message_hash: &Scalar) -> Scalar {
    r.mul(chi).add(&message_hash.mul(k))
}

/// Sums partial signatures, normalizes to low-`s`, and verifies the result
/// against the group public key before returning it.
pub fn aggregate_and_verify(
    r: &Scalar,
    partials: &[Scalar],
    message_hash: &Scalar,
    group_public_key: &Point,
) -> Result<Signature> {
    let mut s = Scalar::zero();
    for sigma in partials {
        s = s.add(sigma);
    }
    if s.is_zero() || r.is_zero() {
        return Err(ThresholdError::SignatureInvalid);
    }

    let normalized_s = if s.is_high() { s.negate() } else { s };
    let signature = Signature { r: *r, s: normalized_s };

    if !verify(&signature, message_hash, group_public_key) {
        return Err(ThresholdError::SignatureInvalid);
    }
    Ok(signature)
}

/// Standard ECDSA verification: `R' = u1*G + u2*X`; accept iff `r == R'.x mod N`.
pub fn verify(signature: &Signature, message_hash: &Scalar, group_public_key: &Point) -> bool {
    let s_inv = match signature.s.invert() {
        Some(inv) => inv,
        None => return false,
    };
    let u1 = message_hash.mul(&s_inv);
    let u2 = signature.r.mul(&s_inv);
    let r_prime = Point::generator().scalar_mul(&u1).add(&group_public_key.scalar_mul(&u2));
    match r_prime.x_scalar_mod_n() {
        Ok(x) => x == signature.r,
        Err(_) => false,
    }
}
