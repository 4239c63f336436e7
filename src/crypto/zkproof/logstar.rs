// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Pi_log*: proves that a Paillier ciphertext C encrypts the discrete log x of
// a curve point X = x*g for an arbitrary generator g (the base point G in
// presign round 2, or the accumulated Gamma in round 3's Delta_i proof).

use super::{challenge, in_range, Field, ZkError, ELL, ELL_PLUS_EPSILON};
use crate::common::random::{get_random_positive_relatively_prime_int, sample_interval, sample_interval_scaled};
use crate::crypto::paillier::PaillierPublic;
use crate::crypto::pedersen::PedersenParameters;
use crate::curve::{Point, Scalar};
use num_bigint_dig::BigInt;
use num_integer::Integer;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogStarProof {
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub a: BigInt,
    pub y: Point,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub s_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub d_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z3: BigInt,
}

pub struct LogStarStatement<'a> {
    pub prover_id: u32,
    pub c: &'a BigInt,
    pub x_point: &'a Point,
    pub generator: &'a Point,
    pub prover_n0: &'a PaillierPublic,
    pub aux: &'a PedersenParameters,
}

impl LogStarProof {
    pub fn prove<R: CryptoRng + RngCore>(
        rng: &mut R,
        stmt: &LogStarStatement,
        x: &BigInt,
        rho: &BigInt,
    ) -> Result<Self, ZkError> {
        let alpha = sample_interval(rng, ELL_PLUS_EPSILON);
        let r = get_random_positive_relatively_prime_int(rng, &stmt.prover_n0.n)
            .ok_or(ZkError::PaillierCheckFailed)?;
        let mu = sample_interval_scaled(rng, ELL, &stmt.aux.n);
        let gamma = sample_interval_scaled(rng, ELL_PLUS_EPSILON, &stmt.aux.n);

        let a = stmt.prover_n0.encrypt(&alpha, &r).map_err(|_| ZkError::PaillierCheckFailed)?;
        let y = stmt.generator.scalar_mul(&Scalar::from_bigint(&alpha));
        let s_commit = stmt.aux.commit(x, &mu);
        let d_commit = stmt.aux.commit(&alpha, &gamma);

        let e = logstar_challenge(stmt, &a, &y, &s_commit, &d_commit);

        let z1 = &alpha + &e * x;
        let z2 = (&r * rho.modpow(&e, &stmt.prover_n0.n)).mod_floor(&stmt.prover_n0.n);
        let z3 = &gamma + &e * &mu;

        Ok(LogStarProof { a, y, s_commit, d_commit, z1, z2, z3 })
    }

    pub fn verify(&self, stmt: &LogStarStatement) -> Result<(), ZkError> {
        if !in_range(&self.z1, ELL_PLUS_EPSILON) {
            return Err(ZkError::RangeCheckFailed);
        }

        let e = logstar_challenge(stmt, &self.a, &self.y, &self.s_commit, &self.d_commit);

        let pedersen_lhs = stmt.aux.commit(&self.z1, &self.z3);
        let pedersen_rhs = (&self.d_commit * self.s_commit.modpow(&e, &stmt.aux.n)).mod_floor(&stmt.aux.n);
        if pedersen_lhs != pedersen_rhs {
            return Err(ZkError::PedersenCheckFailed);
        }

        let enc_z1 = stmt.prover_n0.encrypt(&self.z1, &self.z2).map_err(|_| ZkError::PaillierCheckFailed)?;
        let rhs = (&self.a * stmt.c.modpow(&e, &stmt.prover_n0.n_squared)).mod_floor(&stmt.prover_n0.n_squared);
        if enc_z1 != rhs {
            return Err(ZkError::PaillierCheckFailed);
        }

        let z1_g = stmt.generator.scalar_mul(&Scalar::from_bigint(&self.z1));
        let rhs_point = stmt.x_point.scalar_mul(&Scalar::from_bigint(&e)).add(&self.y);
        if z1_g != rhs_point {
            return Err(ZkError::CurveCheckFailed);
        }

        Ok(())
    }
}

fn logstar_challenge(stmt: &LogStarStatement, a: &BigInt, y: &Point, s_commit: &BigInt, d_commit: &BigInt) -> BigInt {
    let y_bytes = y.to_public_key().map(|b| b.to_vec()).unwrap_or_default();
    let generator_bytes = stmt.generator.to_public_key().map(|b| b.to_vec()).unwrap_or_default();
    let x_point_bytes = stmt.x_point.to_public_key().map(|b| b.to_vec()).unwrap_or_default();
    challenge(
        "log-star",
        &[
            Field::Id(stmt.prover_id),
            Field::Int(&stmt.prover_n0.n),
            Field::Int(&stmt.aux.n),
            Field::Int(&stmt.aux.s),
            Field::Int(&stmt.aux.t),
            Field::Int(stmt.c),
            Field::Bytes(&generator_bytes),
            Field::Bytes(&x_point_bytes),
            Field::Int(a),
            Field::Bytes(&y_bytes),
            Field::Int(s_commit),
            Field::Int(d_commit),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::paillier::PaillierSecret;
    use num_traits::One;
    use rand::thread_rng;

    #[test]
    fn honest_prover_is_accepted_with_base_point_generator() {
        let mut rng = thread_rng();
        let n0_secret = PaillierSecret::for_testing(BigInt::from(11u8), BigInt::from(23u8));
        let n0 = n0_secret.public().clone();
        let (aux, _lambda) = PedersenParameters::generate(
            &mut rng,
            &(BigInt::from(11u8) * BigInt::from(23u8)),
            &(BigInt::from(10u8) * BigInt::from(22u8)),
        )
        .unwrap();

        let x = BigInt::from(9i64);
        let (c, rho) = n0.encrypt_random(&mut rng, &x).unwrap();
        let generator = Point::generator();
        let x_point = generator.scalar_mul(&Scalar::from_bigint(&x));

        let stmt = LogStarStatement {
            prover_id: 1,
            c: &c,
            x_point: &x_point,
            generator: &generator,
            prover_n0: &n0,
            aux: &aux,
        };

        let proof = LogStarProof::prove(&mut rng, &stmt, &x, &rho).unwrap();
        assert!(proof.verify(&stmt).is_ok());
    }

    #[test]
    fn honest_prover_is_accepted_with_arbitrary_generator() {
        let mut rng = thread_rng();
        let n0_secret = PaillierSecret::for_testing(BigInt::from(11u8), BigInt::from(23u8));
        let n0 = n0_secret.public().clone();
        let (aux, _lambda) = PedersenParameters::generate(
            &mut rng,
            &(BigInt::from(11u8) * BigInt::from(23u8)),
            &(BigInt::from(10u8) * BigInt::from(22u8)),
        )
        .unwrap();

        let x = BigInt::from(4i64);
        let (c, rho) = n0.encrypt_random(&mut rng, &x).unwrap();
        // Gamma, an arbitrary accumulated point, stands in for "g" here.
        let gamma = Point::generator().scalar_mul(&Scalar::random(&mut rng));
        let x_point = gamma.scalar_mul(&Scalar::from_bigint(&x));

        let stmt = LogStarStatement {
            prover_id: 1,
            c: &c,
            x_point: &x_point,
            generator: &gamma,
            prover_n0: &n0,
            aux: &aux,
        };

        let proof = LogStarProof::prove(&mut rng, &stmt, &x, &rho).unwrap();
        assert!(proof.verify(&stmt).is_ok());
    }

    #[test]
    fn tampered_proof_is_rejected() {
        let mut rng = thread_rng();
        let n0_secret = PaillierSecret::for_testing(BigInt::from(11u8), BigInt::from(23u8));
        let n0 = n0_secret.public().clone();
        let (aux, _lambda) = PedersenParameters::generate(
            &mut rng,
            &(BigInt::from(11u8) * BigInt::from(23u8)),
            &(BigInt::from(10u8) * BigInt::from(22u8)),
        )
        .unwrap();

        let x = BigInt::from(9i64);
        let (c, rho) = n0.encrypt_random(&mut rng, &x).unwrap();
        let generator = Point::generator();
        let x_point = generator.scalar_mul(&Scalar::from_bigint(&x));

        let stmt = LogStarStatement {
            prover_id: 1,
            c: &c,
            x_point: &x_point,
            generator: &generator,
            prover_n0: &n0,
            aux: &aux,
        };

        let mut proof = LogStarProof::prove(&mut rng, &stmt, &x, &rho).unwrap();
        proof.z1 += BigInt::one();
        assert!(proof.verify(&stmt).is_err());
    }
}
