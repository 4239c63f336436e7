// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Pi_enc: proves a Paillier ciphertext K encrypts a plaintext k in the
// symmetric range +-2^ELL, against a verifier-supplied Pedersen aux.

use super::{challenge, in_range, Field, ZkError, ELL, ELL_PLUS_EPSILON, EPSILON};
use crate::common::random::{get_random_positive_relatively_prime_int, sample_interval, sample_interval_scaled};
use crate::crypto::paillier::PaillierPublic;
use crate::crypto::pedersen::PedersenParameters;
use num_bigint_dig::BigInt;
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncProof {
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub s: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub c: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z3: BigInt,
}

impl EncProof {
    pub fn prove<R: CryptoRng + RngCore>(
        rng: &mut R,
        prover_id: u32,
        k: &BigInt,
        rho: &BigInt,
        k_ciphertext: &BigInt,
        prover_n0: &PaillierPublic,
        verifier_aux: &PedersenParameters,
    ) -> Result<Self, ZkError> {
        let alpha = sample_interval(rng, ELL_PLUS_EPSILON);
        let r = get_random_positive_relatively_prime_int(rng, &prover_n0.n)
            .ok_or(ZkError::PaillierCheckFailed)?;
        let mu = sample_interval_scaled(rng, ELL, &verifier_aux.n);
        let gamma = sample_interval_scaled(rng, ELL_PLUS_EPSILON, &verifier_aux.n);

        let s = verifier_aux.commit(k, &mu);
        let a = prover_n0.encrypt(&alpha, &r).map_err(|_| ZkError::PaillierCheckFailed)?;
        let c = verifier_aux.commit(&alpha, &gamma);

        let e = challenge(
            "enc",
            &[
                Field::Id(prover_id),
                Field::Int(&prover_n0.n),
                Field::Int(&verifier_aux.n),
                Field::Int(&verifier_aux.s),
                Field::Int(&verifier_aux.t),
                Field::Int(k_ciphertext),
                Field::Int(&s),
                Field::Int(&a),
                Field::Int(&c),
            ],
        );

        let z1 = &alpha + &e * k;
        let z2 = (&r * rho.modpow(&e, &prover_n0.n)).mod_floor(&prover_n0.n);
        let z3 = &gamma + &e * &mu;

        Ok(EncProof { s, a, c, z1, z2, z3 })
    }

    pub fn verify(
        &self,
        prover_id: u32,
        k_ciphertext: &BigInt,
        prover_n0: &PaillierPublic,
        verifier_aux: &PedersenParameters,
    ) -> Result<(), ZkError> {
        if !in_range(&self.z1, ELL_PLUS_EPSILON) {
            return Err(ZkError::RangeCheckFailed);
        }

        let e = challenge(
            "enc",
            &[
                Field::Id(prover_id),
                Field::Int(&prover_n0.n),
                Field::Int(&verifier_aux.n),
                Field::Int(&verifier_aux.s),
                Field::Int(&verifier_aux.t),
                Field::Int(k_ciphertext),
                Field::Int(&self.s),
                Field::Int(&self.a),
                Field::Int(&self.c),
            ],
        );

        let pedersen_lhs = verifier_aux.commit(&self.z1, &self.z3);
        let pedersen_rhs = (&self.c * mod_pow(&self.s, &e, &verifier_aux.n)).mod_floor(&verifier_aux.n);
        if pedersen_lhs != pedersen_rhs {
            return Err(ZkError::PedersenCheckFailed);
        }

        let enc_z1 = prover_n0.encrypt(&self.z1, &self.z2).map_err(|_| ZkError::PaillierCheckFailed)?;
        let rhs = (&self.a * mod_pow(k_ciphertext, &e, &prover_n0.n_squared)).mod_floor(&prover_n0.n_squared);
        if enc_z1 != rhs {
            return Err(ZkError::PaillierCheckFailed);
        }

        Ok(())
    }
}

fn mod_pow(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> BigInt {
    base.modpow(exponent, modulus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::paillier::PaillierSecret;
    use rand::thread_rng;

    fn small_paillier() -> PaillierSecret {
        PaillierSecret::for_testing(BigInt::from(11u8), BigInt::from(23u8))
    }

    #[test]
    fn honest_prover_is_accepted() {
        let mut rng = thread_rng();
        let sk = small_paillier();
        let n0 = sk.public().clone();
        let (aux, _lambda) =
            PedersenParameters::generate(&mut rng, &(BigInt::from(11u8) * BigInt::from(23u8)), &(BigInt::from(10u8) * BigInt::from(22u8))).unwrap();

        let k = BigInt::from(5i64);
        let (ciphertext, rho) = n0.encrypt_random(&mut rng, &k).unwrap();

        let proof = EncProof::prove(&mut rng, 1, &k, &rho, &ciphertext, &n0, &aux).unwrap();
        assert!(proof.verify(1, &ciphertext, &n0, &aux).is_ok());
    }

    #[test]
    fn tampered_response_is_rejected() {
        let mut rng = thread_rng();
        let sk = small_paillier();
        let n0 = sk.public().clone();
        let (aux, _lambda) =
            PedersenParameters::generate(&mut rng, &(BigInt::from(11u8) * BigInt::from(23u8)), &(BigInt::from(10u8) * BigInt::from(22u8))).unwrap();

        let k = BigInt::from(5i64);
        let (ciphertext, rho) = n0.encrypt_random(&mut rng, &k).unwrap();
        let mut proof = EncProof::prove(&mut rng, 1, &k, &rho, &ciphertext, &n0, &aux).unwrap();
        proof.z1 += BigInt::one();
        assert!(proof.verify(1, &ciphertext, &n0, &aux).is_err());
    }
}
