// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Concrete secp256k1 `Scalar`/`Point` wrappers around `k256`: a direct,
// always-valid representation rather than a generic over-any-curve
// abstraction, since this crate only ever operates on secp256k1. `Point`
// carries an explicit `Identity` variant rather than using `(0, 0)` as a
// sentinel, since `(0, 0)` is not a point on the curve.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::{Curve, Field};
use k256::{AffinePoint, ProjectivePoint, Secp256k1, U256};
use num_bigint_dig::{BigInt, Sign};
use once_cell::sync::Lazy;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("value out of range: expected < {bound_bits} bits")]
    OutOfRange { bound_bits: u32 },
    #[error("point is not on the curve")]
    NotOnCurve,
    #[error("byte encoding has the wrong length: expected {expected}, got {got}")]
    BadEncodingLength { expected: usize, got: usize },
}

/// The secp256k1 group order `N`, as a `BigInt`, for callers doing modular
/// arithmetic outside the `Scalar` wrapper (Shamir, Lagrange coefficients).
pub static ORDER: Lazy<BigInt> = Lazy::new(|| bigint_from_u256(&Secp256k1::ORDER));

fn bigint_from_u256(u: &U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &u.to_be_bytes())
}

fn u256_from_bigint_mod_n(b: &BigInt) -> k256::Scalar {
    let (sign, mut bytes) = b.to_bytes_be();
    if bytes.len() < 32 {
        let mut padded = vec![0u8; 32 - bytes.len()];
        padded.extend_from_slice(&bytes);
        bytes = padded;
    }
    let reduced = if bytes.len() > 32 {
        k256::Scalar::reduce_bytes((&bytes[bytes.len() - 32..]).into())
    } else {
        let arr: [u8; 32] = bytes.as_slice().try_into().expect("padded to 32");
        k256::Scalar::reduce_bytes((&arr).into())
    };
    if sign == Sign::Minus {
        -reduced
    } else {
        reduced
    }
}

/// An element of `Z_N`, always kept reduced modulo the curve order.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Scalar(k256::Scalar);

impl Scalar {
    pub fn zero() -> Self {
        Scalar(k256::Scalar::ZERO)
    }

    pub fn one() -> Self {
        Scalar(k256::Scalar::ONE)
    }

    /// Reduces `b` modulo `N` at construction time, per the Open Question in
    /// the design notes: out-of-range values are never allowed to leak through.
    pub fn from_bigint(b: &BigInt) -> Self {
        Scalar(u256_from_bigint_mod_n(b))
    }

    pub fn from_bytes_mod_order(bytes: &[u8]) -> Self {
        Scalar(<k256::Scalar as Reduce<U256>>::reduce_bytes(
            k256::FieldBytes::from_slice(&left_pad_or_truncate(bytes, 32)),
        ))
    }

    pub fn random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Scalar(k256::Scalar::random(rng))
    }

    /// Samples a nonzero scalar uniformly from `Z_N^*`.
    pub fn random_nonzero<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        loop {
            let s = k256::Scalar::random(&mut *rng);
            if !bool::from(k256::elliptic_curve::Field::is_zero(&s)) {
                return Scalar(s);
            }
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        BigInt::from_bytes_be(Sign::Plus, self.0.to_bytes().as_slice())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    pub fn add(&self, other: &Scalar) -> Scalar {
        Scalar(self.0 + other.0)
    }

    pub fn sub(&self, other: &Scalar) -> Scalar {
        Scalar(self.0 - other.0)
    }

    pub fn mul(&self, other: &Scalar) -> Scalar {
        Scalar(self.0 * other.0)
    }

    pub fn negate(&self) -> Scalar {
        Scalar(-self.0)
    }

    pub fn invert(&self) -> Option<Scalar> {
        Option::<k256::Scalar>::from(self.0.invert()).map(Scalar)
    }

    pub fn is_zero(&self) -> bool {
        bool::from(k256::elliptic_curve::Field::is_zero(&self.0))
    }

    /// `true` iff this value is greater than `N/2`; used to normalize
    /// signatures to their low-`s` form.
    pub fn is_high(&self) -> bool {
        let n_minus_1 = bigint_from_u256(&Secp256k1::ORDER) - BigInt::from(1u8);
        let half = n_minus_1 / BigInt::from(2u8);
        self.to_bigint() > half
    }

    pub fn mul_generator(&self) -> Point {
        Point::from_projective(ProjectivePoint::GENERATOR * self.0)
    }
}

fn left_pad_or_truncate(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        bytes[bytes.len() - len..].to_vec()
    } else {
        let mut out = vec![0u8; len - bytes.len()];
        out.extend_from_slice(bytes);
        out
    }
}

impl Add for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}
impl Sub for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}
impl Mul for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}
impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        Scalar(-self.0)
    }
}

impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scalar({:x})", self.to_bigint())
    }
}

/// An affine secp256k1 point, with an explicit identity variant rather than
/// the `(0, 0)` sentinel the design notes flag as error-prone.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Point {
    Identity,
    Affine { x: [u8; 32], y: [u8; 32] },
}

impl Point {
    pub fn identity() -> Self {
        Point::Identity
    }

    pub fn generator() -> Self {
        Point::from_projective(ProjectivePoint::GENERATOR)
    }

    fn from_projective(p: ProjectivePoint) -> Self {
        if bool::from(k256::elliptic_curve::group::Group::is_identity(&p)) {
            return Point::Identity;
        }
        let affine = p.to_affine();
        let encoded = affine.to_encoded_point(false);
        let x = encoded.x().expect("non-identity has x");
        let y = encoded.y().expect("non-identity has y");
        Point::Affine {
            x: (*x).into(),
            y: (*y).into(),
        }
    }

    fn to_projective(self) -> ProjectivePoint {
        match self {
            Point::Identity => ProjectivePoint::IDENTITY,
            Point::Affine { x, y } => {
                let mut sec1 = [0u8; 65];
                sec1[0] = 0x04;
                sec1[1..33].copy_from_slice(&x);
                sec1[33..65].copy_from_slice(&y);
                let encoded = k256::EncodedPoint::from_bytes(sec1).expect("well-formed SEC1");
                let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
                    .expect("on curve");
                ProjectivePoint::from(affine)
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Point::Identity)
    }

    /// `y^2 = x^3 + 7 (mod P)`; the identity is considered on-curve vacuously.
    pub fn is_on_curve(&self) -> bool {
        match self {
            Point::Identity => true,
            Point::Affine { x, y } => {
                let sec1_ok = {
                    let mut sec1 = [0u8; 65];
                    sec1[0] = 0x04;
                    sec1[1..33].copy_from_slice(x);
                    sec1[33..65].copy_from_slice(y);
                    k256::EncodedPoint::from_bytes(sec1)
                        .ok()
                        .map(|e| bool::from(AffinePoint::from_encoded_point(&e).is_some()))
                        .unwrap_or(false)
                };
                sec1_ok
            }
        }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::from_projective(self.to_projective() + other.to_projective())
    }

    pub fn double(&self) -> Point {
        Point::from_projective(self.to_projective().double())
    }

    pub fn negate(&self) -> Point {
        Point::from_projective(-self.to_projective())
    }

    pub fn scalar_mul(&self, k: &Scalar) -> Point {
        Point::from_projective(self.to_projective() * k.0)
    }

    /// The uncompressed SEC1 public-key form `0x04 ‖ X ‖ Y`, 65 bytes.
    pub fn to_public_key(&self) -> Result<[u8; 65], CurveError> {
        match self {
            Point::Identity => Err(CurveError::NotOnCurve),
            Point::Affine { x, y } => {
                let mut out = [0u8; 65];
                out[0] = 0x04;
                out[1..33].copy_from_slice(x);
                out[33..65].copy_from_slice(y);
                Ok(out)
            }
        }
    }

    pub fn from_public_key(bytes: &[u8]) -> Result<Self, CurveError> {
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(CurveError::BadEncodingLength { expected: 65, got: bytes.len() });
        }
        let encoded = k256::EncodedPoint::from_bytes(bytes).map_err(|_| CurveError::NotOnCurve)?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or(CurveError::NotOnCurve)?;
        Ok(Point::from_projective(ProjectivePoint::from(affine)))
    }

    /// `x` coordinate reduced mod the curve order `N`, used to derive `r` from
    /// the presigned nonce commitment `R`.
    pub fn x_scalar_mod_n(&self) -> Result<Scalar, CurveError> {
        match self {
            Point::Identity => Err(CurveError::NotOnCurve),
            Point::Affine { x, .. } => Ok(Scalar::from_bytes_mod_order(x)),
        }
    }
}
