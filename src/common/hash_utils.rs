// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use num_bigint_dig::BigInt;
use num_traits::One;

/// Reduces a hash digest into the challenge space `[0, q)`, folding a
/// negative input back to its positive representative.
pub fn rejection_sample(q: &BigInt, e_hash: &BigInt) -> BigInt {
    e_hash.modpow(&BigInt::one(), q)
}
