// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation & adaptation of tss-lib-go/crypto/paillier. Keygen draws safe
// Blum primes via `common::safe_prime`; BitsBlumPrime = 1024 so that
// N = p*q is exactly 2048 bits, per the wire-level constants.

use crate::common::random::{get_random_positive_relatively_prime_int, RandomError};
use crate::common::safe_prime::{get_random_safe_primes_concurrent, SafePrimeError};
use num_bigint_dig::{BigInt, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

pub const BITS_BLUM_PRIME: usize = 1024;
pub const BITS_PAILLIER_MODULUS: usize = 2 * BITS_BLUM_PRIME;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaillierError {
    #[error("ciphertext is not coprime to N^2")]
    InvalidCiphertext,
    #[error("plaintext magnitude exceeds (N-1)/2")]
    OutOfRange,
    #[error("prime generation or validation failed: {0}")]
    PrimeInvalid(String),
    #[error(transparent)]
    Random(#[from] RandomError),
    #[error(transparent)]
    SafePrime(#[from] SafePrimeError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierPublic {
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub n: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub n_squared: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub n_plus_one: BigInt,
}

impl PaillierPublic {
    fn from_n(n: BigInt) -> Self {
        let n_squared = &n * &n;
        let n_plus_one = &n + BigInt::one();
        PaillierPublic { n, n_squared, n_plus_one }
    }

    /// `|m| <= (N-1)/2`, the symmetric plaintext range.
    pub fn max_plaintext_magnitude(&self) -> BigInt {
        (&self.n - BigInt::one()) / BigInt::from(2u8)
    }

    fn check_plaintext_range(&self, m: &BigInt) -> Result<(), PaillierError> {
        if m.abs() > self.max_plaintext_magnitude() {
            return Err(PaillierError::OutOfRange);
        }
        Ok(())
    }

    /// `c = (N+1)^m * rho^N mod N^2`.
    pub fn encrypt(&self, m: &BigInt, rho: &BigInt) -> Result<BigInt, PaillierError> {
        self.check_plaintext_range(m)?;
        let m_pos = if m.sign() == Sign::Minus { m + &self.n } else { m.clone() };
        let c1 = self.n_plus_one.modpow(&m_pos, &self.n_squared);
        let c2 = rho.modpow(&self.n, &self.n_squared);
        Ok((c1 * c2).mod_floor(&self.n_squared))
    }

    /// Samples fresh randomness `rho <- Z_N^*` and encrypts `m`.
    pub fn encrypt_random<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        m: &BigInt,
    ) -> Result<(BigInt, BigInt), PaillierError> {
        let rho = get_random_positive_relatively_prime_int(rng, &self.n)
            .ok_or(PaillierError::OutOfRange)?;
        let c = self.encrypt(m, &rho)?;
        Ok((c, rho))
    }

    fn check_ciphertext(&self, c: &BigInt) -> Result<(), PaillierError> {
        if c.sign() != Sign::Plus || c >= &self.n_squared || c.gcd(&self.n_squared) != BigInt::one() {
            return Err(PaillierError::InvalidCiphertext);
        }
        Ok(())
    }

    /// `a * b mod N^2`. Adds the underlying plaintexts.
    pub fn homomorphic_add(&self, a: &BigInt, b: &BigInt) -> Result<BigInt, PaillierError> {
        self.check_ciphertext(a)?;
        self.check_ciphertext(b)?;
        Ok((a * b).mod_floor(&self.n_squared))
    }

    /// `a^k mod N^2`. Scales the underlying plaintext by `k`.
    pub fn homomorphic_mul(&self, a: &BigInt, k: &BigInt) -> Result<BigInt, PaillierError> {
        self.check_ciphertext(a)?;
        let exponent = if k.sign() == Sign::Minus { k + &self.n } else { k.clone() };
        Ok(a.modpow(&exponent, &self.n_squared))
    }

    /// `Enc(m1; rho1) . Enc(m2; rho2)` combined in a single homomorphic
    /// affine step: `a^k . c mod N^2`, used by the affine-operation proofs.
    pub fn homomorphic_mul_and_add(
        &self,
        a: &BigInt,
        k: &BigInt,
        c: &BigInt,
    ) -> Result<BigInt, PaillierError> {
        let scaled = self.homomorphic_mul(a, k)?;
        self.homomorphic_add(&scaled, c)
    }
}

#[derive(Clone, Zeroize)]
pub struct PaillierSecret {
    p: BigInt,
    q: BigInt,
    phi: BigInt,
    phi_inv: BigInt,
    #[zeroize(skip)]
    public: PaillierPublic,
}

impl PaillierSecret {
    pub fn public(&self) -> &PaillierPublic {
        &self.public
    }

    /// Exposes `phi = (p-1)(q-1)` to the keygen module, which needs it to
    /// derive each party's Pedersen auxiliary parameters from its own
    /// Paillier secret. Not part of the public API: callers outside this
    /// crate have no legitimate use for `phi`.
    pub(crate) fn phi_for_pedersen_derivation(&self) -> BigInt {
        self.phi.clone()
    }

    /// Generates a fresh keypair from two independent 1024-bit safe Blum
    /// primes. Fails with `PrimeInvalid` if either candidate does not hold
    /// the Blum/safe-prime properties the wire format requires.
    pub fn generate() -> Result<Self, PaillierError> {
        let pair = get_random_safe_primes_concurrent(BITS_BLUM_PRIME, 2, 2)?;
        let (g1, g2) = (&pair[0], &pair[1]);
        for g in [g1, g2] {
            if !g.validate() {
                return Err(PaillierError::PrimeInvalid(
                    "safe prime failed Blum/safe validation".into(),
                ));
            }
        }
        Self::from_primes(g1.safe_prime().clone(), g2.safe_prime().clone())
    }

    /// Builds a keypair from two already-validated safe Blum primes.
    /// Re-validates the Blum/safe-prime contract regardless of how the
    /// primes were produced.
    pub fn from_primes(p: BigInt, q: BigInt) -> Result<Self, PaillierError> {
        let four = BigInt::from(4u8);
        let two = BigInt::from(2u8);
        for prime in [&p, &q] {
            if prime.bits() as usize != BITS_BLUM_PRIME {
                return Err(PaillierError::PrimeInvalid(format!(
                    "prime must be exactly {} bits",
                    BITS_BLUM_PRIME
                )));
            }
            if prime.mod_floor(&four) != BigInt::from(3u8) {
                return Err(PaillierError::PrimeInvalid("prime is not a Blum prime (p mod 4 != 3)".into()));
            }
            let sophie_germain = (prime - BigInt::one()) / &two;
            if !num_prime::nt_funcs::is_prime(&sophie_germain, None).probably() {
                return Err(PaillierError::PrimeInvalid("(p-1)/2 is not prime".into()));
            }
        }
        if p == q {
            return Err(PaillierError::PrimeInvalid("p and q must be distinct".into()));
        }

        let n = &p * &q;
        if n.bits() as usize != BITS_PAILLIER_MODULUS {
            return Err(PaillierError::PrimeInvalid(format!(
                "N must be exactly {} bits",
                BITS_PAILLIER_MODULUS
            )));
        }
        let phi = (&p - BigInt::one()) * (&q - BigInt::one());
        let phi_inv = phi.modinv(&n).ok_or_else(|| {
            PaillierError::PrimeInvalid("phi has no inverse mod N".into())
        })?;

        Ok(PaillierSecret { p, q, phi, phi_inv, public: PaillierPublic::from_n(n) })
    }

    /// `L(c^phi mod N^2) . phi^-1 mod N`, returned in the symmetric range
    /// `[-(N-1)/2, (N-1)/2]`.
    pub fn decrypt(&self, c: &BigInt) -> Result<BigInt, PaillierError> {
        self.public.check_ciphertext(c)?;
        let n = &self.public.n;
        let n_squared = &self.public.n_squared;
        let u = c.modpow(&self.phi, n_squared);
        let l = (&u - BigInt::one()) / n;
        let m = (l * &self.phi_inv).mod_floor(n);
        let half = self.public.max_plaintext_magnitude();
        Ok(if m > half { m - n } else { m })
    }
}

impl std::fmt::Debug for PaillierSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaillierSecret").field("public", &self.public).finish_non_exhaustive()
    }
}

#[cfg(test)]
impl PaillierSecret {
    /// Builds a keypair from arbitrary small primes, skipping the
    /// production bit-length check. Used across this crate's test modules
    /// (ZK proofs, presign rounds) so they don't each pay for 1024-bit
    /// keygen.
    pub(crate) fn for_testing(p: BigInt, q: BigInt) -> Self {
        let n = &p * &q;
        let phi = (&p - BigInt::one()) * (&q - BigInt::one());
        let phi_inv = phi.modinv(&n).expect("phi invertible mod N for coprime test primes");
        PaillierSecret { p, q, phi, phi_inv, public: PaillierPublic::from_n(n) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn small_keypair() -> PaillierSecret {
        // (11-1)/2 = 5 prime, 11 mod 4 = 3; (23-1)/2 = 11 prime, 23 mod 4 = 3.
        PaillierSecret::for_testing(BigInt::from(11u8), BigInt::from(23u8))
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let sk = small_keypair();
        let mut rng = thread_rng();
        for m_val in [-100i64, 0, 1, 100] {
            let m = BigInt::from(m_val);
            if m.abs() > sk.public.max_plaintext_magnitude() {
                continue;
            }
            let (c, _rho) = sk.public.encrypt_random(&mut rng, &m).unwrap();
            let decrypted = sk.decrypt(&c).unwrap();
            assert_eq!(decrypted, m);
        }
    }

    #[test]
    fn homomorphic_add_matches_plaintext_sum() {
        let sk = small_keypair();
        let mut rng = thread_rng();
        let m1 = BigInt::from(7u8);
        let m2 = BigInt::from(5u8);
        let (c1, _) = sk.public.encrypt_random(&mut rng, &m1).unwrap();
        let (c2, _) = sk.public.encrypt_random(&mut rng, &m2).unwrap();
        let c3 = sk.public.homomorphic_add(&c1, &c2).unwrap();
        assert_eq!(sk.decrypt(&c3).unwrap(), m1 + m2);
    }

    #[test]
    fn homomorphic_mul_matches_plaintext_scale() {
        let sk = small_keypair();
        let mut rng = thread_rng();
        let m = BigInt::from(6u8);
        let k = BigInt::from(3u8);
        let (c, _) = sk.public.encrypt_random(&mut rng, &m).unwrap();
        let scaled = sk.public.homomorphic_mul(&c, &k).unwrap();
        assert_eq!(sk.decrypt(&scaled).unwrap(), m * k);
    }

    #[test]
    fn rejects_ciphertext_not_coprime_to_n_squared() {
        let sk = small_keypair();
        let bad = sk.public.n.clone(); // shares a factor with N^2
        assert_eq!(sk.decrypt(&bad), Err(PaillierError::InvalidCiphertext));
    }

    #[test]
    fn rejects_plaintext_out_of_range() {
        let sk = small_keypair();
        let too_big = sk.public.max_plaintext_magnitude() + BigInt::one();
        assert_eq!(sk.public.encrypt(&too_big, &BigInt::one()), Err(PaillierError::OutOfRange));
    }

    #[test]
    fn from_primes_rejects_wrong_bit_length() {
        // Production keys require exactly 1024-bit primes; small test primes
        // must be rejected by the bit-length check regardless of their
        // Blum/safe-prime properties.
        let p = BigInt::from(11u8);
        let q = BigInt::from(23u8);
        assert!(matches!(PaillierSecret::from_primes(p, q), Err(PaillierError::PrimeInvalid(_))));
    }
}
