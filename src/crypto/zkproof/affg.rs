// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Pi_aff-g: proves that D = C^x . Enc_N0(y) for x in +-2^ELL, y in
// +-2^ELL_PRIME, and that the same x is the discrete log of a curve point
// X = x*G. Ties a Paillier affine operation to its curve-point image, which
// is what lets presign round 2 bind gamma_i/ecdsaShare_i to Gamma_i/X_i.

use super::{
    challenge, in_range, Field, ZkError, ELL, ELL_PLUS_EPSILON, ELL_PRIME, ELL_PRIME_PLUS_EPSILON,
};
use crate::common::random::{get_random_positive_relatively_prime_int, sample_interval, sample_interval_scaled};
use crate::crypto::paillier::PaillierPublic;
use crate::crypto::pedersen::PedersenParameters;
use crate::curve::{Point, Scalar};
use num_bigint_dig::BigInt;
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AffGProof {
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub a: BigInt,
    pub bx: Point,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub by: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub e_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub s_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub f_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub t_commit: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z3: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub z4: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub w: BigInt,
    #[serde(with = "crate::common::serde_support::bigint_bytes")]
    pub w_y: BigInt,
}

/// Everything public to both prover and verifier of one Pi_aff-g instance.
pub struct AffGStatement<'a> {
    pub prover_id: u32,
    pub c: &'a BigInt,
    pub d: &'a BigInt,
    pub y_ciphertext: &'a BigInt,
    pub x_point: &'a Point,
    pub verifier_n0: &'a PaillierPublic,
    pub prover_n1: &'a PaillierPublic,
    pub aux: &'a PedersenParameters,
}

impl AffGProof {
    #[allow(clippy::too_many_arguments)]
    pub fn prove<R: CryptoRng + RngCore>(
        rng: &mut R,
        stmt: &AffGStatement,
        x: &BigInt,
        y: &BigInt,
        rho: &BigInt,
        rho_y: &BigInt,
    ) -> Result<Self, ZkError> {
        let alpha = sample_interval(rng, ELL_PLUS_EPSILON);
        let beta = sample_interval(rng, ELL_PRIME_PLUS_EPSILON);
        let r = get_random_positive_relatively_prime_int(rng, &stmt.verifier_n0.n)
            .ok_or(ZkError::PaillierCheckFailed)?;
        let r_y = get_random_positive_relatively_prime_int(rng, &stmt.prover_n1.n)
            .ok_or(ZkError::PaillierCheckFailed)?;
        let mu = sample_interval_scaled(rng, ELL, &stmt.aux.n);
        let gamma = sample_interval_scaled(rng, ELL_PLUS_EPSILON, &stmt.aux.n);
        let delta = sample_interval_scaled(rng, ELL_PRIME, &stmt.aux.n);
        let mu_hat = sample_interval_scaled(rng, ELL_PRIME_PLUS_EPSILON, &stmt.aux.n);

        let a = {
            let scaled = stmt.verifier_n0.homomorphic_mul(stmt.c, &alpha).map_err(|_| ZkError::PaillierCheckFailed)?;
            let enc_beta = stmt.verifier_n0.encrypt(&beta, &r).map_err(|_| ZkError::PaillierCheckFailed)?;
            stmt.verifier_n0.homomorphic_add(&scaled, &enc_beta).map_err(|_| ZkError::PaillierCheckFailed)?
        };
        let bx = Point::generator().scalar_mul(&Scalar::from_bigint(&alpha));
        let by = stmt.prover_n1.encrypt(&beta, &r_y).map_err(|_| ZkError::PaillierCheckFailed)?;
        let e_commit = stmt.aux.commit(&alpha, &gamma);
        let s_commit = stmt.aux.commit(x, &mu);
        let f_commit = stmt.aux.commit(&beta, &delta);
        let t_commit = stmt.aux.commit(y, &mu_hat);

        let e = affg_challenge(stmt, &a, &bx, &by, &e_commit, &s_commit, &f_commit, &t_commit);

        let z1 = &alpha + &e * x;
        let z2 = &beta + &e * y;
        let z3 = &gamma + &e * &mu;
        let z4 = &delta + &e * &mu_hat;
        let w = (&r * rho.modpow(&e, &stmt.verifier_n0.n)).mod_floor(&stmt.verifier_n0.n);
        let w_y = (&r_y * rho_y.modpow(&e, &stmt.prover_n1.n)).mod_floor(&stmt.prover_n1.n);

        Ok(AffGProof { a, bx, by, e_commit, s_commit, f_commit, t_commit, z1, z2, z3, z4, w, w_y })
    }

    pub fn verify(&self, stmt: &AffGStatement) -> Result<(), ZkError> {
        if !in_range(&self.z1, ELL_PLUS_EPSILON) {
            return Err(ZkError::RangeCheckFailed);
        }
        if !in_range(&self.z2, ELL_PRIME_PLUS_EPSILON) {
            return Err(ZkError::RangeCheckFailed);
        }

        let e = affg_challenge(stmt, &self.a, &self.bx, &self.by, &self.e_commit, &self.s_commit, &self.f_commit, &self.t_commit);

        let pedersen1_lhs = stmt.aux.commit(&self.z1, &self.z3);
        let pedersen1_rhs =
            (&self.e_commit * self.s_commit.modpow(&e, &stmt.aux.n)).mod_floor(&stmt.aux.n);
        if pedersen1_lhs != pedersen1_rhs {
            return Err(ZkError::PedersenCheckFailed);
        }

        let pedersen2_lhs = stmt.aux.commit(&self.z2, &self.z4);
        let pedersen2_rhs =
            (&self.f_commit * self.t_commit.modpow(&e, &stmt.aux.n)).mod_floor(&stmt.aux.n);
        if pedersen2_lhs != pedersen2_rhs {
            return Err(ZkError::PedersenCheckFailed);
        }

        let lhs0 = {
            let scaled = stmt.verifier_n0.homomorphic_mul(stmt.c, &self.z1).map_err(|_| ZkError::PaillierCheckFailed)?;
            let enc_z2 = stmt.verifier_n0.encrypt(&self.z2, &self.w).map_err(|_| ZkError::PaillierCheckFailed)?;
            stmt.verifier_n0.homomorphic_add(&scaled, &enc_z2).map_err(|_| ZkError::PaillierCheckFailed)?
        };
        let rhs0 = (&self.a * stmt.d.modpow(&e, &stmt.verifier_n0.n_squared)).mod_floor(&stmt.verifier_n0.n_squared);
        if lhs0 != rhs0 {
            return Err(ZkError::PaillierCheckFailed);
        }

        let lhs1 = stmt.prover_n1.encrypt(&self.z2, &self.w_y).map_err(|_| ZkError::PaillierCheckFailed)?;
        let rhs1 = (&self.by * stmt.y_ciphertext.modpow(&e, &stmt.prover_n1.n_squared)).mod_floor(&stmt.prover_n1.n_squared);
        if lhs1 != rhs1 {
            return Err(ZkError::PaillierCheckFailed);
        }

        let z1_g = Point::generator().scalar_mul(&Scalar::from_bigint(&self.z1));
        let rhs_point = stmt.x_point.scalar_mul(&Scalar::from_bigint(&e)).add(&self.bx);
        if z1_g != rhs_point {
            return Err(ZkError::CurveCheckFailed);
        }

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn affg_challenge(
    stmt: &AffGStatement,
    a: &BigInt,
    bx: &Point,
    by: &BigInt,
    e_commit: &BigInt,
    s_commit: &BigInt,
    f_commit: &BigInt,
    t_commit: &BigInt,
) -> BigInt {
    let bx_bytes = bx.to_public_key().map(|b| b.to_vec()).unwrap_or_default();
    challenge(
        "aff-g",
        &[
            Field::Id(stmt.prover_id),
            Field::Int(&stmt.verifier_n0.n),
            Field::Int(&stmt.prover_n1.n),
            Field::Int(&stmt.aux.n),
            Field::Int(&stmt.aux.s),
            Field::Int(&stmt.aux.t),
            Field::Int(stmt.c),
            Field::Int(stmt.d),
            Field::Int(stmt.y_ciphertext),
            Field::Int(a),
            Field::Bytes(&bx_bytes),
            Field::Int(by),
            Field::Int(e_commit),
            Field::Int(s_commit),
            Field::Int(f_commit),
            Field::Int(t_commit),
        ],
    )
}
