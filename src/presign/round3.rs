// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Presign round 3: decrypt incoming affine ciphertexts to recover this
// party's share of gamma*k and x*k, accumulate Gamma across all signers,
// compute Delta_i = k_i*Gamma, and prove that relation with Pi_log*.

use crate::crypto::paillier::{PaillierPublic, PaillierSecret};
use crate::crypto::pedersen::PedersenParameters;
use crate::crypto::zkproof::logstar::{LogStarProof, LogStarStatement};
use crate::curve::{Point, Scalar};
use crate::error::{ProofKind, Result, ThresholdError};
use crate::presign::round2::Round2State;
use num_bigint_dig::BigInt;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use zeroize::Zeroize;

#[derive(Zeroize, Clone, Copy)]
pub struct Round3State {
    pub delta: Scalar,
    #[zeroize(skip)]
    pub delta_point: Point,
    #[zeroize(skip)]
    pub gamma_accum: Point,
    pub chi: Scalar,
    /// Carried forward from round 1 so the signing phase doesn't need to
    /// keep `Round1State`/`Round2State` alive just for this one scalar.
    pub k: Scalar,
}

pub struct Round3Output {
    pub delta: Scalar,
    pub delta_point: Point,
    pub gamma_accum: Point,
    pub proofs: BTreeMap<u32, LogStarProof>,
}

pub struct Round3Incoming {
    pub delta: Scalar,
    pub delta_point: Point,
    pub gamma_accum: Point,
    pub proof: LogStarProof,
}

#[allow(clippy::too_many_arguments)]
pub fn run<R: CryptoRng + RngCore>(
    rng: &mut R,
    my_id: u32,
    my_ecdsa_share_scaled: &Scalar,
    my_paillier_secret: &PaillierSecret,
    my_paillier_public: &PaillierPublic,
    state2: &Round2State,
    incoming: &BTreeMap<u32, crate::presign::round2::Round2Incoming>,
    peer_auxes: &BTreeMap<u32, PedersenParameters>,
    signer_ids: &[u32],
) -> Result<(Round3State, Round3Output)> {
    let mut gamma_accum = state2.gamma_point;
    let mut delta = state2.round1.gamma.mul(&state2.round1.k);
    let mut chi = my_ecdsa_share_scaled.mul(&state2.round1.k);

    for &j in signer_ids {
        if j == my_id {
            continue;
        }
        let msg = incoming.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;
        gamma_accum = gamma_accum.add(&msg.gamma_point);

        let alpha_ij = my_paillier_secret.decrypt(&msg.d).map_err(|e| ThresholdError::from_paillier(e, j))?;
        let alpha_hat_ij = my_paillier_secret.decrypt(&msg.d_hat).map_err(|e| ThresholdError::from_paillier(e, j))?;

        let beta_ij = state2.betas.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;
        let beta_hat_ij = state2.beta_hats.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;

        let term_delta = Scalar::from_bigint(&(alpha_ij + beta_ij));
        let term_chi = Scalar::from_bigint(&(alpha_hat_ij + beta_hat_ij));
        delta = delta.add(&term_delta);
        chi = chi.add(&term_chi);
    }

    let delta_point = gamma_accum.scalar_mul(&state2.round1.k);

    let mut proofs = BTreeMap::new();
    for &j in signer_ids {
        if j == my_id {
            continue;
        }
        let peer_aux = peer_auxes.get(&j).ok_or(ThresholdError::UnknownSigner(j))?;
        let log_stmt = LogStarStatement {
            prover_id: my_id,
            c: &state2.round1.k_ciphertext,
            x_point: &delta_point,
            generator: &gamma_accum,
            prover_n0: my_paillier_public,
            aux: peer_aux,
        };
        let proof = LogStarProof::prove(rng, &log_stmt, &state2.round1.k.to_bigint(), &state2.round1.k_nonce)
            .map_err(|e| ThresholdError::ProofInvalid { round: 3, from: my_id, kind: ProofKind::LogStar, source: e })?;
        proofs.insert(j, proof);
    }

    let state = Round3State { delta, delta_point, gamma_accum, chi, k: state2.round1.k };
    let output = Round3Output { delta, delta_point, gamma_accum, proofs };
    Ok((state, output))
}

/// Verifies a single incoming round-3 message from `from`, as seen by `me`,
/// against `from`'s K ciphertext broadcast in round 1.
pub fn verify_incoming(
    me: u32,
    from: u32,
    incoming: &Round3Incoming,
    from_k_ciphertext: &BigInt,
    from_n0: &PaillierPublic,
    my_aux: &PedersenParameters,
) -> Result<()> {
    let log_stmt = LogStarStatement {
        prover_id: from,
        c: from_k_ciphertext,
        x_point: &incoming.delta_point,
        generator: &incoming.gamma_accum,
        prover_n0: from_n0,
        aux: my_aux,
    };
    incoming
        .proof
        .verify(&log_stmt)
        .map_err(|e| ThresholdError::ProofInvalid { round: 3, from, kind: ProofKind::LogStar, source: e })?;
    let _ = me;
    Ok(())
}
