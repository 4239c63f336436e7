// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Pedersen auxiliary parameters `(N, s, t)` that the ZK range proofs commit
// against: a multiplicative commitment scheme over `Z_N^*`, not a
// general-purpose hash commitment.

use crate::common::random::get_random_generator_of_quadratic_residue;
use num_bigint_dig::{BigInt, Sign};
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PedersenError {
    #[error("could not sample a generator of the quadratic-residue subgroup")]
    GeneratorSampleFailed,
    #[error("S or T is not invertible mod N")]
    NotInvertible,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedersenParameters {
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub n: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub s: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub t: BigInt,
}

impl PedersenParameters {
    /// Derives `(N, s, t)` from a Paillier modulus `N` and its factorization
    /// `phi = (p-1)(q-1)`: samples `t` as a generator of the quadratic-residue
    /// subgroup, a secret exponent `lambda`, and sets `s = t^lambda mod N`.
    pub fn generate<R: CryptoRng + RngCore>(
        rng: &mut R,
        n: &BigInt,
        phi: &BigInt,
    ) -> Result<(Self, BigInt), PedersenError> {
        let t = get_random_generator_of_quadratic_residue(rng, n)
            .ok_or(PedersenError::GeneratorSampleFailed)?;
        let lambda = rng.gen_bigint_in_range_exclusive(phi);
        let s = t.modpow(&lambda, n);
        Ok((PedersenParameters { n: n.clone(), s, t }, lambda))
    }

    /// `commit(x, y) = s^x . t^y mod N`.
    pub fn commit(&self, x: &BigInt, y: &BigInt) -> BigInt {
        let sx = mod_pow_signed(&self.s, x, &self.n);
        let ty = mod_pow_signed(&self.t, y, &self.n);
        (sx * ty).mod_floor(&self.n)
    }

    /// `s^a . t^b ?= S . T^e (mod N)`, requiring `S, T` to lie in `Z_N^*`.
    pub fn verify(&self, a: &BigInt, b: &BigInt, e: &BigInt, big_s: &BigInt, big_t: &BigInt) -> Result<bool, PedersenError> {
        if big_s.gcd(&self.n) != BigInt::one() || big_t.gcd(&self.n) != BigInt::one() {
            return Err(PedersenError::NotInvertible);
        }
        let lhs = self.commit(a, b);
        let rhs = (big_s * mod_pow_signed(big_t, e, &self.n)).mod_floor(&self.n);
        Ok(lhs == rhs)
    }
}

/// `modpow` extended to negative exponents via modular inverse of the base.
fn mod_pow_signed(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> BigInt {
    if exponent.sign() != Sign::Minus {
        base.modpow(exponent, modulus)
    } else {
        let inv = base.modinv(modulus).expect("base invertible mod N");
        inv.modpow(&(-exponent), modulus)
    }
}

trait RandBigIntRange {
    fn gen_bigint_in_range_exclusive(&mut self, bound: &BigInt) -> BigInt;
}

impl<R: RngCore + ?Sized> RandBigIntRange for R {
    fn gen_bigint_in_range_exclusive(&mut self, bound: &BigInt) -> BigInt {
        use num_bigint_dig::RandBigInt;
        self.gen_bigint_range(&BigInt::one(), bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn small_params() -> (PedersenParameters, BigInt) {
        let mut rng = thread_rng();
        let n = BigInt::from(11u8) * BigInt::from(23u8);
        let phi = BigInt::from(10u8) * BigInt::from(22u8);
        PedersenParameters::generate(&mut rng, &n, &phi).unwrap()
    }

    #[test]
    fn commit_and_verify_round_trips() {
        let (params, _lambda) = small_params();
        let x = BigInt::from(17u8);
        let y = BigInt::from(9u8);
        let commitment = params.commit(&x, &y);

        // c ?= s^x t^y with e=0: S = commitment, T = anything invertible.
        let ok = params.verify(&x, &y, &BigInt::from(0u8), &commitment, &params.t).unwrap();
        assert!(ok);
    }

    #[test]
    fn verify_detects_tampered_response() {
        let (params, _lambda) = small_params();
        let x = BigInt::from(17u8);
        let y = BigInt::from(9u8);
        let commitment = params.commit(&x, &y);
        let tampered_x = &x + BigInt::one();
        let ok = params.verify(&tampered_x, &y, &BigInt::from(0u8), &commitment, &params.t).unwrap();
        assert!(!ok);
    }
}
