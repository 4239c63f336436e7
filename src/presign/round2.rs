// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Presign round 2: for each peer j, compute the affine (MtA-style)
// ciphertexts that let j recover a share of gamma_i*k_j (the "delta" leg) and
// of x_i*k_j (the "chi" leg), each backed by a Pi_aff-g proof tying the
// ciphertext to the curve point gamma_i*G / x_i*G. Also proves G_i is
// consistent with Gamma_i = gamma_i*G via Pi_log*.
//
// Unlike the MtA construction this is modeled on, beta/beta_hat are kept as
// local state rather than placed on the wire: the receiver already recovers
// the corresponding alpha/alpha_hat by decryption, so resending beta is
// redundant and, per the design review, better omitted than relied upon.

use crate::common::random::sample_interval;
use crate::crypto::paillier::PaillierPublic;
use crate::crypto::pedersen::PedersenParameters;
use crate::crypto::zkproof::affg::{AffGProof, AffGStatement};
use crate::crypto::zkproof::logstar::{LogStarProof, LogStarStatement};
use crate::crypto::zkproof::{ELL_PRIME};
use crate::curve::{Point, Scalar};
use crate::error::{ProofKind, Result, ThresholdError};
use crate::keygen::PublicPrecomputation;
use crate::presign::round1::Round1State;
use num_bigint_dig::BigInt;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use zeroize::Zeroize;

#[derive(Zeroize)]
pub struct Round2State {
    pub round1: Round1StateFields,
    pub gamma_point: Point,
    #[zeroize(skip)]
    pub betas: BTreeMap<u32, BigInt>,
    #[zeroize(skip)]
    pub beta_hats: BTreeMap<u32, BigInt>,
}

/// Plain copy of the fields `Round1State` keeps, so `Round2State` does not
/// need to hold a `Round1State` by reference across an API boundary.
#[derive(Zeroize)]
pub struct Round1StateFields {
    pub k: Scalar,
    pub gamma: Scalar,
    pub k_nonce: BigInt,
    pub gamma_nonce: BigInt,
    pub k_ciphertext: BigInt,
    pub gamma_ciphertext: BigInt,
}

impl From<&Round1State> for Round1StateFields {
    fn from(s: &Round1State) -> Self {
        Round1StateFields {
            k: s.k,
            gamma: s.gamma,
            k_nonce: s.k_nonce.clone(),
            gamma_nonce: s.gamma_nonce.clone(),
            k_ciphertext: s.k_ciphertext.clone(),
            gamma_ciphertext: s.gamma_ciphertext.clone(),
        }
    }
}

pub struct Round2Output {
    pub gamma_point: Point,
    pub d: BigInt,
    pub f: BigInt,
    pub proof_delta: AffGProof,
    pub d_hat: BigInt,
    pub f_hat: BigInt,
    pub proof_chi: AffGProof,
    pub proof_log: LogStarProof,
}

pub struct Round2Incoming {
    pub gamma_point: Point,
    pub d: BigInt,
    pub f: BigInt,
    pub proof_delta: AffGProof,
    pub d_hat: BigInt,
    pub f_hat: BigInt,
    pub proof_chi: AffGProof,
    pub proof_log: LogStarProof,
}

#[allow(clippy::too_many_arguments)]
pub fn run<R: CryptoRng + RngCore>(
    rng: &mut R,
    my_id: u32,
    my_paillier: &PaillierPublic,
    my_ecdsa_share_scaled: &Scalar,
    my_public_scaled: &Point,
    publics: &BTreeMap<u32, PublicPrecomputation>,
    state: &Round1State,
    peer_k_ciphertexts: &BTreeMap<u32, BigInt>,
    signer_ids: &[u32],
) -> Result<(Round2State, BTreeMap<u32, Round2Output>)> {
    let gamma_point = Point::generator().scalar_mul(&state.gamma);
    let mut outputs = BTreeMap::new();
    let mut betas = BTreeMap::new();
    let mut beta_hats = BTreeMap::new();

    for &j in signer_ids {
        if j == my_id {
            continue;
        }
        let peer_public = publics.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;
        let k_j = peer_k_ciphertexts.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;

        let (d, f, proof_delta, beta) = affine_leg(
            rng,
            my_id,
            j,
            &state.gamma.to_bigint(),
            k_j,
            my_paillier,
            &peer_public.paillier_public,
            &peer_public.aux,
            &gamma_point,
        )?;

        let (d_hat, f_hat, proof_chi, beta_hat) = affine_leg(
            rng,
            my_id,
            j,
            &my_ecdsa_share_scaled.to_bigint(),
            k_j,
            my_paillier,
            &peer_public.paillier_public,
            &peer_public.aux,
            my_public_scaled,
        )?;

        let log_stmt = LogStarStatement {
            prover_id: my_id,
            c: &state.gamma_ciphertext,
            x_point: &gamma_point,
            generator: &Point::generator(),
            prover_n0: my_paillier,
            aux: &peer_public.aux,
        };
        let proof_log = LogStarProof::prove(rng, &log_stmt, &state.gamma.to_bigint(), &state.gamma_nonce)
            .map_err(|e| ThresholdError::ProofInvalid { round: 2, from: my_id, kind: ProofKind::LogStar, source: e })?;

        outputs.insert(
            j,
            Round2Output { gamma_point, d, f, proof_delta, d_hat, f_hat, proof_chi, proof_log },
        );
        betas.insert(j, beta);
        beta_hats.insert(j, beta_hat);
    }

    let new_state = Round2State { round1: (state).into(), gamma_point, betas, beta_hats };
    Ok((new_state, outputs))
}

/// Builds one affine-operation leg: samples `y`, computes `D = K_j^x .
/// Enc_j(-y)`, `F = Enc_i(y)`, and a Pi_aff-g proof tying `x*G` to `D`/`F`.
/// Returns `(D, F, proof, beta = -y)`. The caller keeps `beta` locally.
#[allow(clippy::too_many_arguments)]
fn affine_leg<R: CryptoRng + RngCore>(
    rng: &mut R,
    my_id: u32,
    peer_id: u32,
    x: &BigInt,
    k_j_ciphertext: &BigInt,
    my_n1: &PaillierPublic,
    peer_n0: &PaillierPublic,
    peer_aux: &PedersenParameters,
    x_point: &Point,
) -> Result<(BigInt, BigInt, AffGProof, BigInt)> {
    let y = sample_interval(rng, ELL_PRIME);
    let beta = -y.clone();

    let (enc_neg_y, rho) = peer_n0.encrypt_random(rng, &beta).map_err(ThresholdError::from)?;
    let d = peer_n0
        .homomorphic_mul_and_add(k_j_ciphertext, x, &enc_neg_y)
        .map_err(|e| ThresholdError::from_paillier(e, peer_id))?;
    let (f, rho_y) = my_n1.encrypt_random(rng, &y).map_err(ThresholdError::from)?;

    let stmt = AffGStatement {
        prover_id: my_id,
        c: k_j_ciphertext,
        d: &d,
        y_ciphertext: &f,
        x_point,
        verifier_n0: peer_n0,
        prover_n1: my_n1,
        aux: peer_aux,
    };
    let proof = AffGProof::prove(rng, &stmt, x, &beta, &rho, &rho_y)
        .map_err(|e| ThresholdError::ProofInvalid { round: 2, from: my_id, kind: ProofKind::AffGDelta, source: e })?;

    Ok((d, f, proof, beta))
}

/// Verifies a single incoming round-2 message from `from`, as seen by `me`.
#[allow(clippy::too_many_arguments)]
pub fn verify_incoming(
    me: u32,
    from: u32,
    incoming: &Round2Incoming,
    my_k_ciphertext: &BigInt,
    my_x_point_for_delta_check: &Point,
    my_x_point_for_chi_check: &Point,
    my_n0: &PaillierPublic,
    from_n1: &PaillierPublic,
    my_aux: &PedersenParameters,
) -> Result<()> {
    let delta_stmt = AffGStatement {
        prover_id: from,
        c: my_k_ciphertext,
        d: &incoming.d,
        y_ciphertext: &incoming.f,
        x_point: my_x_point_for_delta_check,
        verifier_n0: my_n0,
        prover_n1: from_n1,
        aux: my_aux,
    };
    incoming.proof_delta.verify(&delta_stmt).map_err(|e| ThresholdError::ProofInvalid {
        round: 2,
        from,
        kind: ProofKind::AffGDelta,
        source: e,
    })?;

    let chi_stmt = AffGStatement {
        prover_id: from,
        c: my_k_ciphertext,
        d: &incoming.d_hat,
        y_ciphertext: &incoming.f_hat,
        x_point: my_x_point_for_chi_check,
        verifier_n0: my_n0,
        prover_n1: from_n1,
        aux: my_aux,
    };
    incoming.proof_chi.verify(&chi_stmt).map_err(|e| ThresholdError::ProofInvalid {
        round: 2,
        from,
        kind: ProofKind::AffGChi,
        source: e,
    })?;

    let _ = me;
    // The Pi_log* leg is checked separately by `verify_log_star`, which needs
    // the sender's G_j ciphertext from round 1.
    Ok(())
}

/// Verifies the Pi_log* component, which needs the sender's G_j ciphertext
/// (not derivable from `Round2Incoming` alone; it was broadcast in round 1).
pub fn verify_log_star(
    from: u32,
    incoming: &Round2Incoming,
    from_gamma_ciphertext: &BigInt,
    from_n1: &PaillierPublic,
    my_aux: &PedersenParameters,
) -> Result<()> {
    let log_stmt = LogStarStatement {
        prover_id: from,
        c: from_gamma_ciphertext,
        x_point: &incoming.gamma_point,
        generator: &Point::generator(),
        prover_n0: from_n1,
        aux: my_aux,
    };
    incoming
        .proof_log
        .verify(&log_stmt)
        .map_err(|e| ThresholdError::ProofInvalid { round: 2, from, kind: ProofKind::LogStar, source: e })
}
