// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation & adaptation of tss-lib-go/common/safe_prime.go.
// Algorithm: "Safe Prime Generation with a Combined Sieve",
// https://eprint.iacr.org/2003/186.pdf
//
// A Sophie Germain pair (q, p = 2q+1) with q an odd prime automatically
// satisfies the Blum condition `p ≡ 3 (mod 4)`: q odd means q = 2k+1, so
// p = 4k+3. Generating safe primes this way is therefore sufficient to
// produce the Blum safe primes the Paillier modulus requires.

use num_bigint_dig::{BigInt, Sign};
use num_integer::Integer;
use num_prime::nt_funcs;
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

static SMALL_PRIMES: [u64; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

static SMALL_PRIMES_PRODUCT: Lazy<BigInt> =
    Lazy::new(|| SMALL_PRIMES.iter().fold(BigInt::one(), |acc, &p| acc * BigInt::from(p)));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafePrimeError {
    #[error("safe prime size must be at least {min_bits} bits, got {got_bits}")]
    BitLengthTooSmall { min_bits: usize, got_bits: usize },
    #[error("num_primes must be greater than 0")]
    NumPrimesZero,
    #[error("concurrency must be greater than 0")]
    ConcurrencyZero,
    #[error("a worker thread panicked during prime generation")]
    WorkerPanicked,
}

/// A Sophie Germain prime pair: `q` prime and `p = 2q + 1` also prime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GermainSafePrime {
    q: BigInt,
    p: BigInt,
}

impl GermainSafePrime {
    /// The Sophie Germain prime `q`.
    pub fn prime(&self) -> &BigInt {
        &self.q
    }

    /// The safe (Blum) prime `p = 2q + 1`.
    pub fn safe_prime(&self) -> &BigInt {
        &self.p
    }

    /// Re-checks that `q`, `p` are both probably prime, that `p = 2q+1`, and
    /// that the Blum condition `p ≡ 3 (mod 4)` holds.
    pub fn validate(&self) -> bool {
        let four = BigInt::from(4u8);
        probably_prime(&self.q)
            && probably_prime(&self.p)
            && self.p == calculate_safe_prime_candidate(&self.q)
            && self.p.mod_floor(&four) == BigInt::from(3u8)
    }
}

fn calculate_safe_prime_candidate(q: &BigInt) -> BigInt {
    q * BigInt::from(2u8) + BigInt::one()
}

fn probably_prime(n: &BigInt) -> bool {
    n.sign() == Sign::Plus && nt_funcs::is_prime(n, None).probably()
}

fn is_coprime_to_small_primes(n: &BigInt) -> bool {
    let n_mod_product = n.mod_floor(&SMALL_PRIMES_PRODUCT);
    if n_mod_product.is_zero() {
        return false;
    }
    let n_mod_small = n_mod_product.to_u64().unwrap_or(0);
    SMALL_PRIMES.iter().all(|&p| n_mod_small % p != 0)
}

/// Pocklington's criterion with base `a = 2`: if `a^(p-1) ≡ 1 (mod p)` and
/// `p = 2q+1` with `q` prime, then `p` is prime.
fn is_pocklington_criterion_satisfied(p: &BigInt, a: &BigInt) -> bool {
    let p_minus_1 = p - BigInt::one();
    a.modpow(&p_minus_1, p).is_one()
}

/// Searches for a single Sophie Germain safe prime pair of `p_bit_len` bits.
fn generate_safe_prime_single<R: CryptoRng + RngCore>(rng: &mut R, p_bit_len: usize) -> GermainSafePrime {
    let q_bit_len = p_bit_len - 1;
    let two = BigInt::from(2u8);
    let three = BigInt::from(3u8);
    let one = BigInt::one();

    loop {
        let mut q = nt_funcs::gen_prime(rng, q_bit_len, None);
        if q.is_even() {
            q += &one;
        }

        for _ in 0..(10 * 128) {
            if !is_coprime_to_small_primes(&q) || q.mod_floor(&three) == one {
                q += &two;
                continue;
            }

            let p = calculate_safe_prime_candidate(&q);
            if !is_coprime_to_small_primes(&p) {
                q += &two;
                continue;
            }

            if !probably_prime(&q) {
                q += &two;
                continue;
            }

            if is_pocklington_criterion_satisfied(&p, &two) && probably_prime(&p) {
                return GermainSafePrime { q, p };
            }

            q += &two;
        }
    }
}

/// Concurrently generates `num_primes` distinct Sophie Germain safe prime
/// pairs of `p_bit_len` bits, spreading the search across `concurrency`
/// worker threads. Each worker uses its own OS-seeded RNG.
pub fn get_random_safe_primes_concurrent(
    p_bit_len: usize,
    num_primes: usize,
    concurrency: usize,
) -> Result<Vec<GermainSafePrime>, SafePrimeError> {
    if p_bit_len < 6 {
        return Err(SafePrimeError::BitLengthTooSmall { min_bits: 6, got_bits: p_bit_len });
    }
    if num_primes == 0 {
        return Err(SafePrimeError::NumPrimesZero);
    }
    if concurrency == 0 {
        return Err(SafePrimeError::ConcurrencyZero);
    }

    let (tx, rx) = mpsc::channel::<GermainSafePrime>();
    let workers = concurrency.min(num_primes.max(1));

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || {
                let mut rng = OsRng;
                loop {
                    let pair = generate_safe_prime_single(&mut rng, p_bit_len);
                    if tx.send(pair).is_err() {
                        return;
                    }
                }
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(num_primes);
        while results.len() < num_primes {
            match rx.recv() {
                Ok(pair) => {
                    if !results.iter().any(|existing: &GermainSafePrime| existing.p == pair.p) {
                        results.push(pair);
                    }
                }
                Err(_) => return Err(SafePrimeError::WorkerPanicked),
            }
        }
        Ok(results)
    })
}
