// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation & extension of tss-lib-go/common/random.go. Extended with the
// symmetric-range samplers (`sample_interval*`) that the CGGMP-style ZK
// proofs need: values drawn uniformly from `±2^bits` rather than `[0, n)`.

use num_bigint_dig::{BigInt, RandBigInt, Sign};
use num_integer::Integer;
use num_prime::nt_funcs;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use log::error;

const MUST_GET_RANDOM_INT_MAX_BITS: usize = 5000;

#[derive(Error, Debug)]
pub enum RandomError {
    #[error("bits must be positive, non-zero, and less than {max_bits}, got {got_bits}")]
    BitsOutOfRange { max_bits: usize, got_bits: usize },
    #[error("invalid length requested: {0}")]
    InvalidLength(usize),
    #[error("error generating random bytes: {0}")]
    RandGenerationError(String),
}

/// Generates a cryptographically secure random non-negative BigInt of `bits` length.
pub fn must_get_random_int<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> BigInt {
    if bits == 0 || bits > MUST_GET_RANDOM_INT_MAX_BITS {
        panic!(
            "must_get_random_int: bits should be positive, non-zero and less than {}",
            MUST_GET_RANDOM_INT_MAX_BITS
        );
    }
    rng.gen_bigint(bits)
}

/// Generates a cryptographically secure random non-negative BigInt less than `less_than`.
pub fn get_random_positive_int<R: CryptoRng + RngCore>(
    rng: &mut R,
    less_than: &BigInt,
) -> Option<BigInt> {
    if less_than.sign() != Sign::Plus {
        error!("get_random_positive_int: less_than must be positive");
        return None;
    }
    Some(rng.gen_bigint_range(&BigInt::zero(), less_than))
}

/// Generates a cryptographically secure random probable prime of `bits` length.
pub fn get_random_prime_int<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Option<BigInt> {
    if bits == 0 {
        error!("get_random_prime_int: bits must be positive");
        return None;
    }
    Some(nt_funcs::gen_prime(rng, bits, None))
}

/// `0 < v < n && gcd(v, n) == 1`.
pub fn is_number_in_multiplicative_group(n: &BigInt, v: &BigInt) -> bool {
    n.sign() == Sign::Plus && v.sign() == Sign::Plus && v < n && v.gcd(n).is_one()
}

/// Samples a uniformly random element of `(Z/nZ)*`.
pub fn get_random_positive_relatively_prime_int<R: CryptoRng + RngCore>(
    rng: &mut R,
    n: &BigInt,
) -> Option<BigInt> {
    if n.sign() != Sign::Plus {
        error!("get_random_positive_relatively_prime_int: n must be positive");
        return None;
    }
    loop {
        let candidate = rng.gen_bigint_range(&BigInt::one(), n);
        if candidate.gcd(n).is_one() {
            return Some(candidate);
        }
    }
}

/// Samples `f^2 mod n` for a random `f` coprime to `n`, a generator of the
/// subgroup of quadratic residues when `n` is a product of two safe primes.
pub fn get_random_generator_of_quadratic_residue<R: CryptoRng + RngCore>(
    rng: &mut R,
    n: &BigInt,
) -> Option<BigInt> {
    if n.sign() != Sign::Plus {
        error!("get_random_generator_of_quadratic_residue: n must be positive");
        return None;
    }
    let f = get_random_positive_relatively_prime_int(rng, n)?;
    Some(f.modpow(&BigInt::from(2u8), n))
}

/// Fills `length` bytes from a cryptographically secure RNG.
pub fn get_random_bytes<R: CryptoRng + RngCore>(
    rng: &mut R,
    length: usize,
) -> Result<Vec<u8>, RandomError> {
    if length == 0 {
        return Err(RandomError::InvalidLength(length));
    }
    let mut buf = vec![0u8; length];
    rng.try_fill_bytes(&mut buf)
        .map_err(|e| RandomError::RandGenerationError(e.to_string()))?;
    Ok(buf)
}

/// Samples a value in the symmetric range `±2^bits`, i.e. magnitude uniform
/// in `[0, 2^bits)` with an independently random sign. Used throughout the
/// ZK range proofs (`±2^ℓ`, `±2^(ℓ+ε)`, etc).
pub fn sample_interval<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> BigInt {
    let magnitude = rng.gen_bigint(bits);
    if rng.gen_bool(0.5) {
        -magnitude
    } else {
        magnitude
    }
}

/// Samples a value in `±2^bits · n`, used for the masking terms `μ`, `γ` that
/// blind a Pedersen commitment exponent against a Paillier-sized modulus.
pub fn sample_interval_scaled<R: CryptoRng + RngCore>(rng: &mut R, bits: usize, n: &BigInt) -> BigInt {
    sample_interval(rng, bits) * n
}

/// `|n|` has at most `bits` bits; the range-membership test used by every
/// ZK proof verifier (`z ∈ ±2^(ℓ+ε)` etc).
pub fn fits_in_bits(n: &BigInt, bits: usize) -> bool {
    n.bits() <= bits as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_must_get_random_int() {
        let mut rng = thread_rng();
        let val = must_get_random_int(&mut rng, 128);
        assert!(val.bits() <= 128);
        assert!(val.sign() != Sign::Minus);
        assert_ne!(val, must_get_random_int(&mut rng, 128));
    }

    #[test]
    #[should_panic]
    fn test_must_get_random_int_panic_zero() {
        let mut rng = thread_rng();
        must_get_random_int(&mut rng, 0);
    }

    #[test]
    fn test_get_random_positive_int() {
        let mut rng = thread_rng();
        let less_than = BigInt::from(10000u64);
        let val = get_random_positive_int(&mut rng, &less_than).unwrap();
        assert!(val < less_than && val.sign() != Sign::Minus);
        assert!(get_random_positive_int(&mut rng, &BigInt::zero()).is_none());
    }

    #[test]
    fn test_get_random_prime_int() {
        let mut rng = thread_rng();
        let prime = get_random_prime_int(&mut rng, 64).unwrap();
        assert!(prime.bits() <= 64);
        assert!(nt_funcs::is_prime(&prime, None).probably());
    }

    #[test]
    fn test_is_number_in_multiplicative_group() {
        let n = BigInt::from(10u64);
        assert!(is_number_in_multiplicative_group(&n, &BigInt::from(3u64)));
        assert!(!is_number_in_multiplicative_group(&n, &BigInt::from(2u64)));
        assert!(!is_number_in_multiplicative_group(&n, &BigInt::from(10u64)));
    }

    #[test]
    fn test_get_random_positive_relatively_prime_int() {
        let mut rng = thread_rng();
        let n = BigInt::from(100u64);
        let val = get_random_positive_relatively_prime_int(&mut rng, &n).unwrap();
        assert!(val > BigInt::zero() && val < n);
        assert!(val.gcd(&n).is_one());
    }

    #[test]
    fn test_get_random_bytes() {
        let mut rng = thread_rng();
        let bytes = get_random_bytes(&mut rng, 32).unwrap();
        assert_eq!(bytes.len(), 32);
        assert!(get_random_bytes(&mut rng, 0).is_err());
    }

    #[test]
    fn test_sample_interval_bounds_and_sign() {
        let mut rng = thread_rng();
        let mut saw_negative = false;
        let mut saw_positive = false;
        for _ in 0..200 {
            let v = sample_interval(&mut rng, 64);
            assert!(fits_in_bits(&v, 64));
            if v.sign() == Sign::Minus {
                saw_negative = true;
            } else {
                saw_positive = true;
            }
        }
        assert!(saw_negative && saw_positive);
    }

    #[test]
    fn test_sample_interval_scaled() {
        let mut rng = thread_rng();
        let n = BigInt::from(1_000_003u64);
        let v = sample_interval_scaled(&mut rng, 32, &n);
        assert!(fits_in_bits(&v, 32 + (n.bits() as usize) + 1));
    }
}
