// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Top-level error taxonomy. Every failure has a named kind; proof and
// consistency failures are fatal to the session, with no local retry.

use crate::crypto::zkproof::ZkError;
use thiserror::Error;

/// Identifies which of the three ZK proofs a `ProofInvalid` failure came from.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    #[error("Pi_enc")]
    Enc,
    #[error("Pi_aff-g (delta)")]
    AffGDelta,
    #[error("Pi_aff-g (chi)")]
    AffGChi,
    #[error("Pi_log*")]
    LogStar,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("ciphertext from party {from} is not coprime to N^2")]
    InvalidCiphertext { from: u32 },

    #[error("round {round} proof {kind} from party {from} failed verification: {source}")]
    ProofInvalid { round: u8, from: u32, kind: ProofKind, source: ZkError },

    #[error("Paillier prime generation or validation failed: {0}")]
    PrimeInvalid(String),

    #[error("presign finalize check failed: delta*G != Delta")]
    PresignInconsistent,

    #[error("combined signature failed secp256k1 verification")]
    SignatureInvalid,

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("rejection sampler exceeded its iteration budget")]
    SampleExhausted,

    #[error("unknown signer id {0} referenced in session configuration")]
    UnknownSigner(u32),

    #[error("signer set has {got} members, need at least {need}")]
    SignerSetTooSmall { got: usize, need: usize },

    #[error("session is in state {state}, expected {expected}")]
    WrongSessionState { state: &'static str, expected: &'static str },
}

/// Converts a Paillier error with no peer-ciphertext context: own encryption
/// (which never rechecks ciphertext validity) or keygen's prime validation.
/// Call sites that process a ciphertext supplied by another party must use
/// [`ThresholdError::from_paillier`] instead, so the real sender ends up in
/// `InvalidCiphertext { from }` rather than a fabricated id.
impl From<crate::crypto::paillier::PaillierError> for ThresholdError {
    fn from(e: crate::crypto::paillier::PaillierError) -> Self {
        match e {
            crate::crypto::paillier::PaillierError::InvalidCiphertext => {
                unreachable!("InvalidCiphertext must be attributed to its sender via ThresholdError::from_paillier")
            }
            crate::crypto::paillier::PaillierError::OutOfRange => {
                ThresholdError::OutOfRange("Paillier plaintext".into())
            }
            crate::crypto::paillier::PaillierError::PrimeInvalid(msg) => ThresholdError::PrimeInvalid(msg),
            other => ThresholdError::PrimeInvalid(other.to_string()),
        }
    }
}

impl ThresholdError {
    /// Converts a Paillier error encountered while operating on ciphertext
    /// that party `from` supplied, attributing `InvalidCiphertext` to the
    /// actual sender so the session can reject that peer specifically.
    pub fn from_paillier(e: crate::crypto::paillier::PaillierError, from: u32) -> Self {
        match e {
            crate::crypto::paillier::PaillierError::InvalidCiphertext => ThresholdError::InvalidCiphertext { from },
            other => ThresholdError::from(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ThresholdError>;
