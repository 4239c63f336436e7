// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Polynomial evaluation and Lagrange interpolation over the secp256k1 scalar
// field. No commitment-to-coefficients step is included here: key generation
// is a centralized trusted-dealer variant that does not broadcast verifiable
// shares, so the shares themselves never need to be checked against a public
// commitment.

use crate::curve::Scalar;
use rand::{CryptoRng, RngCore};

/// A random polynomial `f(X) = secret + a_1*X + ... + a_t*X^t` of degree `t`
/// over `Z_N`, used to split `secret` into `n` Shamir shares.
pub struct Polynomial {
    coefficients: Vec<Scalar>,
}

impl Polynomial {
    /// `coefficients[0]` is the secret being shared; the remaining `threshold`
    /// coefficients are drawn uniformly at random.
    pub fn new_random<R: CryptoRng + RngCore>(rng: &mut R, secret: Scalar, threshold: usize) -> Self {
        let mut coefficients = Vec::with_capacity(threshold + 1);
        coefficients.push(secret);
        for _ in 0..threshold {
            coefficients.push(Scalar::random(rng));
        }
        Polynomial { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluates `f(x)` via Horner's method.
    pub fn evaluate(&self, x: &Scalar) -> Scalar {
        let mut acc = Scalar::zero();
        for coeff in self.coefficients.iter().rev() {
            acc = acc.mul(x).add(coeff);
        }
        acc
    }

    pub fn secret(&self) -> Scalar {
        self.coefficients[0]
    }
}

/// `lambda_i = prod_{j in ids, j != i} j * (j - i)^-1 mod N`, the Lagrange
/// coefficient reconstructing `f(0)` from evaluations at `ids` when `i` is
/// itself evaluated at its own id.
pub fn lagrange_coefficient(ids: &[u32], i: u32) -> Scalar {
    let xi = Scalar::from_bigint(&num_bigint_dig::BigInt::from(i));
    let mut numerator = Scalar::one();
    let mut denominator = Scalar::one();
    for &j in ids {
        if j == i {
            continue;
        }
        let xj = Scalar::from_bigint(&num_bigint_dig::BigInt::from(j));
        numerator = numerator.mul(&xj);
        denominator = denominator.mul(&xj.sub(&xi));
    }
    numerator.mul(&denominator.invert().expect("distinct ids give nonzero denominator"))
}

/// Reconstructs `f(0) = sum_{i in S} lambda_i * share_i` from any subset `S`
/// of evaluations, for `|S| >= threshold + 1`.
pub fn reconstruct(ids: &[u32], shares: &[(u32, Scalar)]) -> Scalar {
    let mut acc = Scalar::zero();
    for &(i, share) in shares {
        let lambda_i = lagrange_coefficient(ids, i);
        acc = acc.add(&lambda_i.mul(&share));
    }
    acc
}
