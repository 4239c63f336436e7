// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

pub mod round1;
pub mod round2;
pub mod round3;

use crate::curve::{Point, Scalar};
use crate::error::{Result, ThresholdError};

/// The output of a completed presign: the shared nonce commitment `R`, and
/// each signer's `chi` share needed to produce a partial signature.
pub struct PresignOutput {
    pub r_point: Point,
    pub delta: Scalar,
}

impl PresignOutput {
    /// `r = R.x mod N`.
    pub fn r_scalar(&self) -> Result<Scalar> {
        self.r_point.x_scalar_mod_n().map_err(|e| ThresholdError::OutOfRange(e.to_string()))
    }
}

/// Checks `delta*G == Delta` and derives `R = delta^-1 * Gamma`, per the
/// finalize step at the end of round 3. `Delta` is the point-sum of every
/// signer's `Delta_i`; `gamma` is the common accumulated `Gamma`.
pub fn finalize(delta: &Scalar, delta_point_sum: &Point, gamma: &Point) -> Result<PresignOutput> {
    let expected = Point::generator().scalar_mul(delta);
    if &expected != delta_point_sum {
        return Err(ThresholdError::PresignInconsistent);
    }
    let delta_inv = delta.invert().ok_or(ThresholdError::PresignInconsistent)?;
    let r_point = gamma.scalar_mul(&delta_inv);
    Ok(PresignOutput { r_point, delta: *delta })
}
