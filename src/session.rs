// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Wires the presign rounds and signing phase together into a single local
// orchestrator, playing the role of the network transport that would shuttle
// round outputs between parties in a real deployment: delivering each
// party's outputs to every other party. A real deployment would run each
// party in its own process and swap this module's direct function calls for
// real messages.
//
// Mutable per-round state is modeled as a tagged variant moving through
// Init -> R1Done -> R2Done -> R3Done -> Signed; each transition consumes the
// prior state and produces the next, so a half-finished round can never be
// observed from outside.

use crate::crypto::pedersen::PedersenParameters;
use crate::curve::{Point, Scalar};
use crate::error::{Result, ThresholdError};
use crate::keygen::{scale_for_signer_set, scale_public_for_signer_set, PublicPrecomputation, SecretPrecomputation};
use crate::presign::{round1, round2, round3, PresignOutput};
use crate::sign::{self, Signature};
use num_bigint_dig::BigInt;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use zeroize::Zeroize;

/// Tags the lifecycle of one signer's session. Each variant owns exactly the
/// state that round has produced so far; dropping a `Session` at any point
/// wipes whatever key material it's holding.
pub enum SessionState {
    Init,
    R1Done(round1::Round1State),
    R2Done(round2::Round2State),
    R3Done(round3::Round3State),
    Signed(Signature),
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::Init => "Init",
            SessionState::R1Done(_) => "R1Done",
            SessionState::R2Done(_) => "R2Done",
            SessionState::R3Done(_) => "R3Done",
            SessionState::Signed(_) => "Signed",
        }
    }
}

/// One party's view of an in-progress signing ceremony: its own precomputed
/// material plus the public precomputations of every other signer. The
/// `advance_round*` methods are the per-party counterpart to
/// `run_full_signing_ceremony`'s in-process shortcut: a real deployment calls
/// these as messages arrive over the network instead of handing every
/// party's secret state to one orchestrator.
pub struct Session<'a> {
    pub id: u32,
    pub signer_ids: Vec<u32>,
    pub secret: &'a SecretPrecomputation,
    pub publics: &'a BTreeMap<u32, PublicPrecomputation>,
    pub state: SessionState,
}

impl<'a> Session<'a> {
    pub fn new(id: u32, signer_ids: Vec<u32>, secret: &'a SecretPrecomputation, publics: &'a BTreeMap<u32, PublicPrecomputation>) -> Self {
        Session { id, signer_ids, secret, publics, state: SessionState::Init }
    }

    fn scaled_ecdsa_share(&self) -> Scalar {
        scale_for_signer_set(&self.signer_ids, self.secret)
    }

    fn scaled_public(&self) -> Point {
        scale_public_for_signer_set(&self.signer_ids, &self.publics[&self.id])
    }

    /// Takes ownership of `self.state`, matching it against the expected
    /// variant and restoring `Init` in its place. Returns the inner state on
    /// a match, or puts the original state back and errors otherwise.
    fn take_state(&mut self, expected: &'static str) -> Result<SessionStateSlot> {
        let slot = match std::mem::replace(&mut self.state, SessionState::Init) {
            SessionState::R1Done(s) if expected == "R1Done" => SessionStateSlot::R1(s),
            SessionState::R2Done(s) if expected == "R2Done" => SessionStateSlot::R2(s),
            SessionState::R3Done(s) if expected == "R3Done" => SessionStateSlot::R3(s),
            other => {
                let got = other.label();
                self.state = other;
                return Err(ThresholdError::WrongSessionState { state: got, expected });
            }
        };
        Ok(slot)
    }

    /// Round 1: sample `k`, `gamma`, encrypt them, and prove each ciphertext
    /// is well-formed for every peer. `Init -> R1Done`.
    pub fn advance_round1<R: CryptoRng + RngCore>(&mut self, rng: &mut R) -> Result<round1::Round1Output> {
        if self.state.label() != "Init" {
            return Err(ThresholdError::WrongSessionState { state: self.state.label(), expected: "Init" });
        }
        let own_public = &self.publics[&self.id].paillier_public;
        let (state, output) = round1::run(rng, self.secret, own_public, self.publics, &self.signer_ids)?;
        self.state = SessionState::R1Done(state);
        Ok(output)
    }

    /// Round 2: verify every peer's round-1 message, then build the affine
    /// (MtA-style) legs and Pi_log* proof addressed to each peer.
    /// `R1Done -> R2Done`.
    pub fn advance_round2<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        incoming: &BTreeMap<u32, round1::Round1Incoming>,
        peer_k_ciphertexts: &BTreeMap<u32, BigInt>,
    ) -> Result<BTreeMap<u32, round2::Round2Output>> {
        let round1_state = match self.take_state("R1Done")? {
            SessionStateSlot::R1(s) => s,
            _ => unreachable!(),
        };

        for (&from, msg) in incoming {
            if let Err(e) = round1::verify_incoming(self.id, from, msg, &self.publics[&from].paillier_public, &self.publics[&self.id].aux) {
                self.state = SessionState::R1Done(round1_state);
                return Err(e);
            }
        }

        let ecdsa_share_scaled = self.scaled_ecdsa_share();
        let public_scaled = self.scaled_public();
        let own_paillier = &self.publics[&self.id].paillier_public;

        let result = round2::run(
            rng,
            self.id,
            own_paillier,
            &ecdsa_share_scaled,
            &public_scaled,
            self.publics,
            &round1_state,
            peer_k_ciphertexts,
            &self.signer_ids,
        );
        match result {
            Ok((state2, outputs)) => {
                self.state = SessionState::R2Done(state2);
                Ok(outputs)
            }
            Err(e) => {
                self.state = SessionState::R1Done(round1_state);
                Err(e)
            }
        }
    }

    /// Round 3: verify every peer's round-2 message (both AffG legs and the
    /// Pi_log* consistency proof on their Gamma ciphertext), then decrypt and
    /// accumulate this party's share of `delta`/`chi` and prove the Delta
    /// relation. `R2Done -> R3Done`.
    pub fn advance_round3<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        incoming: &BTreeMap<u32, round2::Round2Incoming>,
        peer_gamma_ciphertexts: &BTreeMap<u32, BigInt>,
    ) -> Result<round3::Round3Output> {
        let round2_state = match self.take_state("R2Done")? {
            SessionStateSlot::R2(s) => s,
            _ => unreachable!(),
        };

        for (&from, msg) in incoming {
            let my_k_ciphertext = &round2_state.round1.k_ciphertext;
            let chi_check_point = scale_public_for_signer_set(&self.signer_ids, &self.publics[&from]);
            if let Err(e) = round2::verify_incoming(
                self.id,
                from,
                msg,
                my_k_ciphertext,
                &msg.gamma_point,
                &chi_check_point,
                &self.publics[&self.id].paillier_public,
                &self.publics[&from].paillier_public,
                &self.publics[&self.id].aux,
            ) {
                self.state = SessionState::R2Done(round2_state);
                return Err(e);
            }
            let from_gamma_ciphertext = match peer_gamma_ciphertexts.get(&from) {
                Some(c) => c,
                None => {
                    self.state = SessionState::R2Done(round2_state);
                    return Err(ThresholdError::UnknownSigner(from));
                }
            };
            if let Err(e) = round2::verify_log_star(from, msg, from_gamma_ciphertext, &self.publics[&from].paillier_public, &self.publics[&self.id].aux) {
                self.state = SessionState::R2Done(round2_state);
                return Err(e);
            }
        }

        let ecdsa_share_scaled = self.scaled_ecdsa_share();
        let peer_auxes: BTreeMap<u32, PedersenParameters> = self
            .signer_ids
            .iter()
            .filter(|&&j| j != self.id)
            .map(|&j| (j, self.publics[&j].aux.clone()))
            .collect();

        let result = round3::run(
            rng,
            self.id,
            &ecdsa_share_scaled,
            &self.secret.paillier_secret,
            &self.publics[&self.id].paillier_public,
            &round2_state,
            incoming,
            &peer_auxes,
            &self.signer_ids,
        );
        match result {
            Ok((state3, output)) => {
                self.state = SessionState::R3Done(state3);
                Ok(output)
            }
            Err(e) => {
                self.state = SessionState::R2Done(round2_state);
                Err(e)
            }
        }
    }

    /// Verifies every peer's round-3 broadcast, checks the `delta*G == Delta`
    /// consistency relation across the whole signer set, and returns this
    /// party's share of the partial signature for `message`. Leaves the
    /// session in `R3Done`; call [`Session::finish`] once the aggregated
    /// signature comes back from whichever party combines the shares.
    pub fn partial_signature(
        &self,
        incoming: &BTreeMap<u32, round3::Round3Incoming>,
        peer_k_ciphertexts: &BTreeMap<u32, BigInt>,
        message: &[u8],
    ) -> Result<Scalar> {
        let round3_state = match &self.state {
            SessionState::R3Done(s) => s,
            other => return Err(ThresholdError::WrongSessionState { state: other.label(), expected: "R3Done" }),
        };

        let mut delta_sum = round3_state.delta;
        let mut delta_point_sum = round3_state.delta_point;
        for (&from, msg) in incoming {
            let from_k_ciphertext = peer_k_ciphertexts.get(&from).ok_or(ThresholdError::UnknownSigner(from))?;
            round3::verify_incoming(self.id, from, msg, from_k_ciphertext, &self.publics[&from].paillier_public, &self.publics[&self.id].aux)?;
            delta_sum = delta_sum.add(&msg.delta);
            delta_point_sum = delta_point_sum.add(&msg.delta_point);
        }

        let presign: PresignOutput = crate::presign::finalize(&delta_sum, &delta_point_sum, &round3_state.gamma_accum)?;
        let r = presign.r_scalar()?;
        let message_hash = sign::hash_message(message);
        Ok(sign::partial_signature(&r, &round3_state.chi, &round3_state.k, &message_hash))
    }

    /// Records the signature an external aggregator combined from every
    /// party's partial share. `R3Done -> Signed`.
    pub fn finish(&mut self, signature: Signature) -> Result<()> {
        if self.state.label() != "R3Done" {
            return Err(ThresholdError::WrongSessionState { state: self.state.label(), expected: "R3Done" });
        }
        self.state = SessionState::Signed(signature);
        Ok(())
    }
}

enum SessionStateSlot {
    R1(round1::Round1State),
    R2(round2::Round2State),
    R3(round3::Round3State),
}

/// Runs a complete presign + sign ceremony for every signer in `signer_ids`,
/// entirely in-process. Useful both for tests and as a single-process
/// deployment mode.
pub fn run_full_signing_ceremony(
    signer_ids: &[u32],
    secrets: &BTreeMap<u32, SecretPrecomputation>,
    publics: &BTreeMap<u32, PublicPrecomputation>,
    group_public_key: &Point,
    message: &[u8],
) -> Result<Signature> {
    let mut rng = OsRng;

    // --- Round 1 ---
    let mut round1_states = BTreeMap::new();
    let mut round1_outputs = BTreeMap::new();
    for &id in signer_ids {
        let secret = &secrets[&id];
        let own_public = &publics[&id].paillier_public;
        let (state, output) = round1::run(&mut rng, secret, own_public, publics, signer_ids)?;
        round1_states.insert(id, state);
        round1_outputs.insert(id, output);
    }

    for &i in signer_ids {
        for &j in signer_ids {
            if i == j {
                continue;
            }
            let incoming = round1::Round1Incoming {
                k_ciphertext: round1_outputs[&j].k_ciphertext.clone(),
                gamma_ciphertext: round1_outputs[&j].gamma_ciphertext.clone(),
                proof: round1_outputs[&j].proofs[&i].clone(),
            };
            round1::verify_incoming(i, j, &incoming, &publics[&j].paillier_public, &publics[&i].aux)?;
        }
    }

    // --- Round 2 ---
    let mut round2_states = BTreeMap::new();
    let mut round2_outputs: BTreeMap<u32, BTreeMap<u32, round2::Round2Output>> = BTreeMap::new();
    for &id in signer_ids {
        let secret = &secrets[&id];
        let ecdsa_share_scaled = scale_for_signer_set(signer_ids, secret);
        let public_scaled = scale_public_for_signer_set(signer_ids, &publics[&id]);
        let own_paillier = &publics[&id].paillier_public;

        let peer_k_ciphertexts: BTreeMap<u32, num_bigint_dig::BigInt> = signer_ids
            .iter()
            .filter(|&&j| j != id)
            .map(|&j| (j, round1_outputs[&j].k_ciphertext.clone()))
            .collect();

        let (state, outputs) = round2::run(
            &mut rng,
            id,
            own_paillier,
            &ecdsa_share_scaled,
            &public_scaled,
            publics,
            &round1_states[&id],
            &peer_k_ciphertexts,
            signer_ids,
        )?;
        round2_states.insert(id, state);
        round2_outputs.insert(id, outputs);
    }

    for &i in signer_ids {
        for &j in signer_ids {
            if i == j {
                continue;
            }
            let msg = &round2_outputs[&j][&i];
            let incoming = round2::Round2Incoming {
                gamma_point: msg.gamma_point,
                d: msg.d.clone(),
                f: msg.f.clone(),
                proof_delta: msg.proof_delta.clone(),
                d_hat: msg.d_hat.clone(),
                f_hat: msg.f_hat.clone(),
                proof_chi: msg.proof_chi.clone(),
                proof_log: msg.proof_log.clone(),
            };
            let my_k_ciphertext = &round1_outputs[&i].k_ciphertext;
            let gamma_point_j = round1_states[&j].gamma.mul_generator();
            round2::verify_incoming(
                i,
                j,
                &incoming,
                my_k_ciphertext,
                &gamma_point_j,
                &ecdsa_share_scaled_i_point_for(j, signer_ids, publics),
                &publics[&i].paillier_public,
                &publics[&j].paillier_public,
                &publics[&i].aux,
            )?;
            round2::verify_log_star(
                j,
                &incoming,
                &round1_outputs[&j].gamma_ciphertext,
                &publics[&j].paillier_public,
                &publics[&i].aux,
            )?;
        }
    }

    // --- Round 3 ---
    let mut round3_states = BTreeMap::new();
    let mut round3_outputs = BTreeMap::new();
    for &id in signer_ids {
        let secret = &secrets[&id];
        let ecdsa_share_scaled = scale_for_signer_set(signer_ids, secret);
        let own_paillier_secret = &secret.paillier_secret;
        let own_paillier_public = &publics[&id].paillier_public;

        let incoming: BTreeMap<u32, round2::Round2Incoming> = signer_ids
            .iter()
            .filter(|&&j| j != id)
            .map(|&j| {
                let msg = &round2_outputs[&j][&id];
                (
                    j,
                    round2::Round2Incoming {
                        gamma_point: msg.gamma_point,
                        d: msg.d.clone(),
                        f: msg.f.clone(),
                        proof_delta: msg.proof_delta.clone(),
                        d_hat: msg.d_hat.clone(),
                        f_hat: msg.f_hat.clone(),
                        proof_chi: msg.proof_chi.clone(),
                        proof_log: msg.proof_log.clone(),
                    },
                )
            })
            .collect();

        let peer_auxes: BTreeMap<u32, PedersenParameters> = signer_ids
            .iter()
            .filter(|&&j| j != id)
            .map(|&j| (j, publics[&j].aux.clone()))
            .collect();

        let (state, output) = round3::run(
            &mut rng,
            id,
            &ecdsa_share_scaled,
            own_paillier_secret,
            own_paillier_public,
            &round2_states[&id],
            &incoming,
            &peer_auxes,
            signer_ids,
        )?;
        round3_states.insert(id, state);
        round3_outputs.insert(id, output);
    }

    for &i in signer_ids {
        for &j in signer_ids {
            if i == j {
                continue;
            }
            let msg = &round3_outputs[&j];
            let incoming = round3::Round3Incoming {
                delta: msg.delta,
                delta_point: msg.delta_point,
                gamma_accum: msg.gamma_accum,
                proof: msg.proofs[&i].clone(),
            };
            round3::verify_incoming(
                i,
                j,
                &incoming,
                &round1_outputs[&j].k_ciphertext,
                &publics[&j].paillier_public,
                &publics[&i].aux,
            )?;
        }
    }

    // --- Finalize presign ---
    let mut delta_sum = Scalar::zero();
    let mut delta_point_sum = Point::identity();
    let gamma = round3_outputs[&signer_ids[0]].gamma_accum;
    for &id in signer_ids {
        delta_sum = delta_sum.add(&round3_outputs[&id].delta);
        delta_point_sum = delta_point_sum.add(&round3_outputs[&id].delta_point);
    }
    let presign = crate::presign::finalize(&delta_sum, &delta_point_sum, &gamma)?;
    let r = presign.r_scalar()?;

    // --- Signing ---
    let message_hash = sign::hash_message(message);
    let partials: Vec<Scalar> = signer_ids
        .iter()
        .map(|&id| sign::partial_signature(&r, &round3_states[&id].chi, &round3_states[&id].k, &message_hash))
        .collect();

    sign::aggregate_and_verify(&r, &partials, &message_hash, group_public_key)
}

fn ecdsa_share_scaled_i_point_for(
    id: u32,
    signer_ids: &[u32],
    publics: &BTreeMap<u32, PublicPrecomputation>,
) -> Point {
    scale_public_for_signer_set(signer_ids, &publics[&id])
}

impl Drop for SessionState {
    fn drop(&mut self) {
        match self {
            SessionState::R1Done(s) => s.zeroize(),
            SessionState::R2Done(s) => s.zeroize(),
            SessionState::R3Done(s) => s.zeroize(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::trusted_dealer_keygen;

    #[test]
    fn three_of_three_signs_hello() {
        let out = trusted_dealer_keygen(3, 1, 1000).unwrap();
        let signer_ids: Vec<u32> = out.ids.clone();
        let signature = run_full_signing_ceremony(
            &signer_ids,
            &out.secrets,
            &out.publics,
            &out.group_public_key,
            b"hello",
        )
        .unwrap();

        let message_hash = sign::hash_message(b"hello");
        assert!(sign::verify(&signature, &message_hash, &out.group_public_key));
        assert!(!signature.s.is_high());
    }

    /// Drives each party's `Session` one round at a time, as a real
    /// multi-process deployment would, rather than going through
    /// `run_full_signing_ceremony`'s in-process shortcut.
    #[test]
    fn per_party_session_api_agrees_with_orchestrator() {
        let out = trusted_dealer_keygen(3, 1, 1000).unwrap();
        let signer_ids: Vec<u32> = out.ids.clone();
        let message = b"per-party session";
        let mut rng = OsRng;

        let mut sessions: BTreeMap<u32, Session> = signer_ids
            .iter()
            .map(|&id| (id, Session::new(id, signer_ids.clone(), &out.secrets[&id], &out.publics)))
            .collect();

        let mut round1_outputs = BTreeMap::new();
        for &id in &signer_ids {
            round1_outputs.insert(id, sessions.get_mut(&id).unwrap().advance_round1(&mut rng).unwrap());
        }

        let mut round2_outputs: BTreeMap<u32, BTreeMap<u32, round2::Round2Output>> = BTreeMap::new();
        for &id in &signer_ids {
            let incoming: BTreeMap<u32, round1::Round1Incoming> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| {
                    (
                        j,
                        round1::Round1Incoming {
                            k_ciphertext: round1_outputs[&j].k_ciphertext.clone(),
                            gamma_ciphertext: round1_outputs[&j].gamma_ciphertext.clone(),
                            proof: round1_outputs[&j].proofs[&id].clone(),
                        },
                    )
                })
                .collect();
            let peer_k_ciphertexts: BTreeMap<u32, num_bigint_dig::BigInt> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| (j, round1_outputs[&j].k_ciphertext.clone()))
                .collect();
            let outputs = sessions.get_mut(&id).unwrap().advance_round2(&mut rng, &incoming, &peer_k_ciphertexts).unwrap();
            round2_outputs.insert(id, outputs);
        }

        let mut round3_outputs = BTreeMap::new();
        for &id in &signer_ids {
            let incoming: BTreeMap<u32, round2::Round2Incoming> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| {
                    let msg = &round2_outputs[&j][&id];
                    (
                        j,
                        round2::Round2Incoming {
                            gamma_point: msg.gamma_point,
                            d: msg.d.clone(),
                            f: msg.f.clone(),
                            proof_delta: msg.proof_delta.clone(),
                            d_hat: msg.d_hat.clone(),
                            f_hat: msg.f_hat.clone(),
                            proof_chi: msg.proof_chi.clone(),
                            proof_log: msg.proof_log.clone(),
                        },
                    )
                })
                .collect();
            let peer_gamma_ciphertexts: BTreeMap<u32, num_bigint_dig::BigInt> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| (j, round1_outputs[&j].gamma_ciphertext.clone()))
                .collect();
            let output = sessions.get_mut(&id).unwrap().advance_round3(&mut rng, &incoming, &peer_gamma_ciphertexts).unwrap();
            round3_outputs.insert(id, output);
        }

        let mut delta_sum = Scalar::zero();
        let mut delta_point_sum = Point::identity();
        let gamma = round3_outputs[&signer_ids[0]].gamma_accum;
        for &id in &signer_ids {
            delta_sum = delta_sum.add(&round3_outputs[&id].delta);
            delta_point_sum = delta_point_sum.add(&round3_outputs[&id].delta_point);
        }
        let presign = crate::presign::finalize(&delta_sum, &delta_point_sum, &gamma).unwrap();
        let r = presign.r_scalar().unwrap();

        let mut partials = Vec::new();
        for &id in &signer_ids {
            let incoming: BTreeMap<u32, round3::Round3Incoming> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| {
                    let msg = &round3_outputs[&j];
                    (
                        j,
                        round3::Round3Incoming {
                            delta: msg.delta,
                            delta_point: msg.delta_point,
                            gamma_accum: msg.gamma_accum,
                            proof: msg.proofs[&id].clone(),
                        },
                    )
                })
                .collect();
            let peer_k_ciphertexts: BTreeMap<u32, num_bigint_dig::BigInt> = signer_ids
                .iter()
                .filter(|&&j| j != id)
                .map(|&j| (j, round1_outputs[&j].k_ciphertext.clone()))
                .collect();
            let sigma = sessions[&id].partial_signature(&incoming, &peer_k_ciphertexts, message).unwrap();
            partials.push(sigma);
        }

        let message_hash = sign::hash_message(message);
        let signature = sign::aggregate_and_verify(&r, &partials, &message_hash, &out.group_public_key).unwrap();
        assert!(sign::verify(&signature, &message_hash, &out.group_public_key));

        for &id in &signer_ids {
            sessions.get_mut(&id).unwrap().finish(signature.clone()).unwrap();
        }
    }
}
