// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Centralized trusted-dealer key generation: produces per-party secret and
// public precomputations from a single random degree-t polynomial. No
// broadcast/bias-resistance is attempted here; a real distributed-key-
// generation protocol is explicitly out of scope.

use crate::crypto::paillier::PaillierSecret;
use crate::crypto::pedersen::PedersenParameters;
use crate::crypto::shamir::{lagrange_coefficient, Polynomial};
use crate::curve::{Point, Scalar};
use crate::error::{ThresholdError, Result};
use log::info;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use zeroize::Zeroize;

pub const SSID_BYTES: usize = 16;

/// A session identifier binding one key-generation ceremony. Derived from a
/// 32-byte random sample, hashed with SHA-256 and truncated to 16 bytes.
pub fn generate_ssid<R: CryptoRng + RngCore>(rng: &mut R) -> [u8; SSID_BYTES] {
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    let digest = Sha256::digest(seed);
    let mut ssid = [0u8; SSID_BYTES];
    ssid.copy_from_slice(&digest[..SSID_BYTES]);
    ssid
}

#[derive(Clone, Zeroize)]
pub struct SecretPrecomputation {
    pub id: u32,
    #[zeroize(skip)]
    pub ssid: [u8; SSID_BYTES],
    pub threshold: usize,
    pub ecdsa_share: Scalar,
    pub paillier_secret: PaillierSecret,
}

#[derive(Clone)]
pub struct PublicPrecomputation {
    pub id: u32,
    pub ssid: [u8; SSID_BYTES],
    pub public_ecdsa: Point,
    pub paillier_public: crate::crypto::paillier::PaillierPublic,
    pub aux: PedersenParameters,
}

pub struct KeygenOutput {
    pub ids: Vec<u32>,
    pub secrets: BTreeMap<u32, SecretPrecomputation>,
    pub publics: BTreeMap<u32, PublicPrecomputation>,
    pub group_public_key: Point,
}

/// Generates `n` distinct party ids in `1..=id_range`, a degree-`threshold`
/// Shamir sharing of a fresh secret key, and independent Paillier/Pedersen
/// material for every party.
pub fn trusted_dealer_keygen(n: usize, threshold: usize, id_range: u32) -> Result<KeygenOutput> {
    if (id_range as usize) < n {
        return Err(ThresholdError::OutOfRange(format!(
            "id_range {} too small for {} parties",
            id_range, n
        )));
    }
    let mut rng = OsRng;
    let ssid = generate_ssid(&mut rng);

    let mut candidates: Vec<u32> = (1..=id_range).collect();
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let idx = (rng.next_u32() as usize) % candidates.len();
        ids.push(candidates.remove(idx));
    }
    ids.sort_unstable();

    let secret_key = Scalar::random_nonzero(&mut rng);
    let polynomial = Polynomial::new_random(&mut rng, secret_key, threshold);
    let group_public_key = Point::generator().scalar_mul(&secret_key);

    let mut secrets = BTreeMap::new();
    let mut publics = BTreeMap::new();

    for &id in &ids {
        info!("keygen: generating Paillier material for party {}", id);
        let x_i = Scalar::from_bigint(&num_bigint_dig::BigInt::from(id));
        let ecdsa_share = polynomial.evaluate(&x_i);
        let public_ecdsa = Point::generator().scalar_mul(&ecdsa_share);

        let paillier_secret = PaillierSecret::generate()?;
        let paillier_public = paillier_secret.public().clone();
        let (aux, _lambda) = PedersenParameters::generate(
            &mut rng,
            &paillier_public.n,
            &paillier_phi(&paillier_secret),
        )
        .map_err(|e| ThresholdError::PrimeInvalid(e.to_string()))?;

        secrets.insert(
            id,
            SecretPrecomputation { id, ssid, threshold, ecdsa_share, paillier_secret },
        );
        publics.insert(id, PublicPrecomputation { id, ssid, public_ecdsa, paillier_public, aux });
    }

    Ok(KeygenOutput { ids, secrets, publics, group_public_key })
}

/// Exposes `phi = (p-1)(q-1)` for Pedersen parameter derivation without
/// making it a public field of `PaillierSecret` (it must stay zeroized and
/// never escape the keygen boundary).
fn paillier_phi(secret: &PaillierSecret) -> num_bigint_dig::BigInt {
    secret.phi_for_pedersen_derivation()
}

/// Lagrange-scales a signer subset's shares and public points: `lambda_i *
/// ecdsaShare_i`, `lambda_i * publicEcdsa_i`. The sum of scaled public points
/// must equal the group public key; the first postcondition callers should
/// verify after scaling.
pub fn scale_for_signer_set(
    ids: &[u32],
    secret: &SecretPrecomputation,
) -> Scalar {
    let lambda = lagrange_coefficient(ids, secret.id);
    lambda.mul(&secret.ecdsa_share)
}

pub fn scale_public_for_signer_set(ids: &[u32], public: &PublicPrecomputation) -> Point {
    let lambda = lagrange_coefficient(ids, public.id);
    public.public_ecdsa.scalar_mul(&lambda)
}

/// `publicKeyFromShares`: reconstructs the group public key from any signer
/// subset's (unscaled) public points, summing their Lagrange-scaled images.
pub fn public_key_from_shares(ids: &[u32], publics: &BTreeMap<u32, PublicPrecomputation>) -> Result<Point> {
    let mut sum = Point::identity();
    for &id in ids {
        let public = publics.get(&id).ok_or(ThresholdError::UnknownSigner(id))?;
        sum = sum.add(&scale_public_for_signer_set(ids, public));
    }
    Ok(sum)
}
